//! The throttle actor
//!
//! All throttle checks in one process funnel through a single task that
//! owns the store, so in-process occurrences are serialized without any
//! shared-state locking; the store's own lock files remain responsible for
//! other processes sharing the storage root. Handles are cheap to clone
//! and safe to use from any task.

use std::time::SystemTime;

use tokio::sync::{mpsc, oneshot};

use crate::error::NotifyError;
use squelch::{
    Fingerprint, StoreError, Throttle, ThrottleLimits, ThrottleOutcome, ThrottleRecord,
    ThrottleStore,
};

/// Message types for the throttle actor
pub enum ThrottleMessage {
    Check {
        fingerprint: Fingerprint,
        seed: ThrottleRecord,
        limits: ThrottleLimits,
        now: SystemTime,
        response_tx: oneshot::Sender<Result<ThrottleOutcome, StoreError>>,
    },
}

/// Handle to communicate with the throttle actor
#[derive(Clone)]
pub struct ThrottleHandle {
    tx: mpsc::Sender<ThrottleMessage>,
}

impl ThrottleHandle {
    /// Run the admit/deny check for one occurrence
    pub async fn check(
        &self,
        fingerprint: Fingerprint,
        seed: ThrottleRecord,
        limits: ThrottleLimits,
        now: SystemTime,
    ) -> Result<ThrottleOutcome, NotifyError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(ThrottleMessage::Check {
                fingerprint,
                seed,
                limits,
                now,
                response_tx,
            })
            .await
            .map_err(|_| NotifyError::ThrottleStopped)?;

        response_rx
            .await
            .map_err(|_| NotifyError::ThrottleStopped)?
            .map_err(NotifyError::Storage)
    }
}

/// The throttle actor
pub struct ThrottleActor;

impl ThrottleActor {
    /// Spawn an actor owning the given store
    ///
    /// The actor runs until every handle is dropped.
    pub fn spawn<S>(buffer_size: usize, store: S) -> ThrottleHandle
    where
        S: ThrottleStore + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer_size);

        tokio::spawn(async move {
            run_actor(rx, Throttle::new(store)).await;
        });

        ThrottleHandle { tx }
    }
}

async fn run_actor<S: ThrottleStore>(
    mut rx: mpsc::Receiver<ThrottleMessage>,
    mut throttle: Throttle<S>,
) {
    while let Some(msg) = rx.recv().await {
        match msg {
            ThrottleMessage::Check {
                fingerprint,
                seed,
                limits,
                now,
                response_tx,
            } => {
                let response = throttle.check(&fingerprint, seed, limits, now);
                // Ignore send errors - the caller may have given up waiting
                let _ = response_tx.send(response);
            }
        }
    }

    tracing::debug!("throttle actor shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use squelch::MemoryStore;
    use std::time::Duration;

    fn limits(count_limit: u32) -> ThrottleLimits {
        ThrottleLimits {
            count_limit,
            window: Duration::from_secs(1800),
        }
    }

    fn seed(subject: &str) -> ThrottleRecord {
        ThrottleRecord::new(subject.to_string(), vec![])
    }

    #[tokio::test]
    async fn test_checks_flow_through_the_actor() {
        let handle = ThrottleActor::spawn(16, MemoryStore::new());
        let fp = Fingerprint::from_subject("[ERROR] (E)");

        let mut admitted = 0;
        for _ in 0..5 {
            let outcome = handle
                .check(fp.clone(), seed("[ERROR] (E)"), limits(3), SystemTime::now())
                .await
                .unwrap();
            if outcome.admitted {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
    }

    #[tokio::test]
    async fn test_concurrent_callers_never_over_admit() {
        let handle = ThrottleActor::spawn(64, MemoryStore::new());
        let count_limit = 4;

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let fp = Fingerprint::from_subject("[ERROR] (Race)");
                handle
                    .check(
                        fp,
                        seed("[ERROR] (Race)"),
                        limits(count_limit),
                        SystemTime::now(),
                    )
                    .await
                    .unwrap()
                    .admitted
            }));
        }

        let mut admitted: u32 = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, count_limit);
    }
}
