//! Error types for the notification pipeline

use thiserror::Error;

use crate::channel::DeliveryError;
use squelch::StoreError;

/// Failures surfaced by [`notify`](crate::ErrorNotifier::notify)
///
/// Throttling itself never fails on business grounds — an occurrence always
/// resolves to admit or suppress. Only the I/O boundaries produce errors,
/// and both are reported to the caller rather than logged and swallowed:
/// silent loss of alerting is a failure an operator must be able to see.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The throttle store could not be read, written, or locked.
    /// Policy is fail closed: the notification was not sent.
    #[error("throttle storage failed: {0}")]
    Storage(#[from] StoreError),

    /// The delivery channel rejected or failed to transmit the payload
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// The throttle worker task is gone (host runtime shutting down)
    #[error("throttle worker stopped")]
    ThrottleStopped,
}
