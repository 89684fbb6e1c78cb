use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::{Duration, SystemTime};

use squelch::core::subject::{SubjectOptions, compose};
use squelch::{Fingerprint, MemoryStore, Throttle, ThrottleLimits, ThrottleRecord};

fn bench_subject_compose(c: &mut Criterion) {
    let opts = SubjectOptions {
        prefix: "[ERROR] ".to_string(),
        correlation: Some("orders#create".to_string()),
        verbose: true,
        normalize_digits: true,
        ..SubjectOptions::default()
    };

    c.bench_function("subject_compose_normalized", |b| {
        b.iter(|| {
            compose(
                black_box("TimeoutError"),
                black_box("upstream 10.0.0.7 did not respond within 3000ms"),
                &opts,
            )
        })
    });
}

fn bench_fingerprint(c: &mut Criterion) {
    let subject = "[ERROR] orders#create (TimeoutError) \"upstream did not respond\"";
    c.bench_function("fingerprint_from_subject", |b| {
        b.iter(|| Fingerprint::from_subject(black_box(subject)))
    });
}

fn bench_memory_throttle_check(c: &mut Criterion) {
    let mut throttle = Throttle::new(MemoryStore::new());
    let fp = Fingerprint::from_subject("[ERROR] (BenchError)");
    let limits = ThrottleLimits {
        count_limit: 5,
        window: Duration::from_secs(1800),
    };

    c.bench_function("memory_throttle_check", |b| {
        b.iter(|| {
            let seed = ThrottleRecord::new("[ERROR] (BenchError)".to_string(), vec![]);
            throttle
                .check(&fp, black_box(seed), limits, SystemTime::now())
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_subject_compose,
    bench_fingerprint,
    bench_memory_throttle_check
);
criterion_main!(benches);
