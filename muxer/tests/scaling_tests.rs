// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use muxer::{multiplex, MuxConfig, Multiplexer};
use muxer_test_utils::sources::{values, workload, MAX_DELAY, MIN_DELAY};
use muxer_test_utils::{assert_same_multiset, drain_within};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_2500_workers_close_after_worst_case() -> anyhow::Result<()> {
    // Arrange
    let started = Instant::now();
    let sources = workload(2_500, MIN_DELAY, MAX_DELAY);
    let (tx, rx) = muxer::unbounded();

    // Act
    let handle = multiplex(tx, sources)?;
    let received = drain_within(rx, Duration::from_secs(5)).await;
    let elapsed = started.elapsed();

    // Assert
    assert_eq!(received.len(), 2_500);
    assert!(received.iter().all(|d| *d >= MIN_DELAY && *d <= MAX_DELAY));
    assert!(received.contains(&MAX_DELAY));
    assert!(elapsed >= MAX_DELAY, "closed early after {elapsed:?}");
    assert!(
        elapsed < MAX_DELAY + Duration::from_millis(1_000),
        "closed too late after {elapsed:?}"
    );
    assert_eq!(handle.join().await.sources_completed, 2_500);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_10000_sources_per_source_and_pooled() -> anyhow::Result<()> {
    let expected: Vec<u32> = (0..10_000).collect();

    for config in [
        MuxConfig::default(),
        MuxConfig::default().pooled(NonZeroUsize::new(16).unwrap()),
        MuxConfig::default().max_concurrent_relays(NonZeroUsize::new(256).unwrap()),
    ] {
        let (tx, rx) = muxer::bounded(64);
        let handle = Multiplexer::new()
            .config(config.clone())
            .sources(expected.iter().map(|i| values(vec![*i])))
            .destination(tx)
            .start()?;

        let received = drain_within(rx, Duration::from_secs(10)).await;

        assert_same_multiset(&received, &expected);
        let report = handle.join().await;
        assert_eq!(report.sources_completed, 10_000, "{config:?}");
        assert_eq!(report.values_relayed, 10_000, "{config:?}");
    }
    Ok(())
}
