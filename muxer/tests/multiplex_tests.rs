// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::StreamExt;
use muxer::{multiplex, Multiplexer, Phase};
use muxer_core::{BoxSource, Destination};
use muxer_test_utils::sources::{empty, never_ending, paced, panicking, values};
use muxer_test_utils::{
    assert_in_relative_order, assert_same_multiset, drain_within, RecordingDestination,
};
use std::sync::Arc;
use std::time::Duration;

const GRACE: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_three_sources_merge_then_close() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = muxer::unbounded();
    let sources = vec![values(vec![1]), values(vec![2, 3]), empty()];

    // Act
    let handle = multiplex(tx, sources)?;
    let received = drain_within(rx, GRACE).await;

    // Assert
    assert_same_multiset(&received, &[1, 2, 3]);
    assert_in_relative_order(&received, &[2, 3]);

    let report = handle.join().await;
    assert_eq!(report.sources, 3);
    assert_eq!(report.values_relayed, 3);
    assert_eq!(report.sources_completed, 3);
    assert_eq!(report.sources_abandoned, 0);
    assert!(!report.cancelled);
    Ok(())
}

#[tokio::test]
async fn test_single_empty_source_still_closes_destination() -> anyhow::Result<()> {
    // Arrange
    let destination = RecordingDestination::<u8>::new();

    // Act
    let handle = multiplex(Arc::clone(&destination), vec![empty()])?;
    tokio::time::timeout(GRACE, handle.closed()).await?;

    // Assert
    assert!(destination.is_empty());
    assert_eq!(destination.close_count(), 1);
    assert_eq!(handle.phase(), Phase::Closed);
    Ok(())
}

#[tokio::test]
async fn test_zero_sources_is_configuration_error() {
    // Arrange
    let destination = RecordingDestination::<u8>::new();

    // Act
    let result = multiplex(Arc::clone(&destination), Vec::<BoxSource<u8>>::new());

    // Assert
    assert!(result.unwrap_err().is_configuration());
    assert_eq!(destination.close_count(), 0);
}

#[tokio::test]
async fn test_missing_destination_is_configuration_error() {
    let result = Multiplexer::<u8, Arc<RecordingDestination<u8>>>::new()
        .source(values(vec![1]))
        .start();

    assert!(result.unwrap_err().is_configuration());
}

#[tokio::test]
async fn test_already_closed_destination_is_configuration_error() {
    // Arrange
    let (tx, rx) = muxer::bounded::<u8>(1);
    drop(rx);

    // Act
    let result = multiplex(tx, vec![values(vec![1])]);

    // Assert
    assert!(result.unwrap_err().is_configuration());
}

#[test]
fn test_start_outside_runtime_is_configuration_error() {
    // Arrange
    let destination = RecordingDestination::<u8>::new();

    // Act
    let result = multiplex(Arc::clone(&destination), vec![values(vec![1])]);

    // Assert
    let error = result.unwrap_err();
    assert!(error.is_configuration(), "{error}");
    assert_eq!(destination.close_count(), 0);
    assert!(destination.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_completions_close_exactly_once() -> anyhow::Result<()> {
    // Arrange
    let destination = RecordingDestination::new();
    let sources: Vec<_> = (0..1_000u32).map(|i| values(vec![i])).collect();

    // Act
    let handle = multiplex(Arc::clone(&destination), sources)?;
    let report = tokio::time::timeout(GRACE, handle.join()).await?;

    // Assert
    assert_eq!(destination.close_count(), 1);
    assert_eq!(destination.sends_after_close(), 0);
    assert_same_multiset(&destination.values(), &(0..1_000).collect::<Vec<_>>());
    assert_eq!(report.values_relayed, 1_000);
    assert_eq!(report.sources_completed, 1_000);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_source_order_is_preserved() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = muxer::bounded(4);
    let sources: Vec<_> = (0..20u32)
        .map(|source| {
            let items = (0..10u32).map(|seq| (source, seq)).collect();
            paced(items, Duration::from_millis(1))
        })
        .collect();

    // Act
    let _handle = multiplex(tx, sources)?;
    let received = drain_within(rx, GRACE).await;

    // Assert
    assert_eq!(received.len(), 200);
    for source in 0..20u32 {
        let expected: Vec<_> = (0..10u32).map(|seq| (source, seq)).collect();
        assert_in_relative_order(&received, &expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_destination_stays_open_while_any_source_is_active() -> anyhow::Result<()> {
    // Arrange
    let destination = RecordingDestination::new();
    let sources = vec![
        values(vec![1]),
        paced(vec![2], Duration::from_millis(100)),
    ];

    // Act
    let handle = multiplex(Arc::clone(&destination), sources)?;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Assert
    assert_eq!(destination.values(), vec![1]);
    assert!(!destination.is_closed());
    assert_eq!(handle.phase(), Phase::Active { remaining: 1 });

    tokio::time::timeout(GRACE, handle.closed()).await?;
    assert_eq!(destination.values(), vec![1, 2]);
    assert_eq!(destination.close_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_refused_send_ends_only_that_relay_path() -> anyhow::Result<()> {
    // Arrange
    let destination = RecordingDestination::failing_after(3);
    let sources = vec![
        paced(vec![1, 2, 3, 4, 5], Duration::from_millis(1)),
        paced(vec![10, 20, 30, 40, 50], Duration::from_millis(1)),
    ];

    // Act
    let handle = multiplex(Arc::clone(&destination), sources)?;
    let report = tokio::time::timeout(GRACE, handle.join()).await?;

    // Assert
    assert_eq!(destination.len(), 3);
    assert_eq!(destination.close_count(), 1);
    assert_eq!(report.values_relayed, 3);
    assert_eq!(report.sources_abandoned, 2);
    Ok(())
}

#[tokio::test]
async fn test_panicking_source_is_abandoned_and_destination_closes() -> anyhow::Result<()> {
    // Arrange
    let destination = RecordingDestination::new();
    let sources = vec![values(vec![1, 2]), panicking(vec![3])];

    // Act
    let handle = multiplex(Arc::clone(&destination), sources)?;
    let report = tokio::time::timeout(GRACE, handle.join()).await?;

    // Assert
    assert_same_multiset(&destination.values(), &[1, 2, 3]);
    assert_eq!(destination.close_count(), 1);
    assert_eq!(report.sources_completed, 1);
    assert_eq!(report.sources_abandoned, 1);
    Ok(())
}

#[tokio::test]
async fn test_builder_accepts_mixed_source_kinds() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = muxer::unbounded();
    let (channel_tx, channel_rx) = tokio::sync::mpsc::unbounded_channel();
    channel_tx.send(100)?;
    drop(channel_tx);

    // Act
    let handle = Multiplexer::new()
        .source(futures::stream::iter(vec![1, 2]))
        .source(muxer_core::from_unbounded_receiver(channel_rx))
        .sources(vec![values(vec![3])])
        .destination(tx)
        .start()?;

    // Assert
    let received: Vec<i32> = rx.collect().await;
    assert_same_multiset(&received, &[1, 2, 3, 100]);
    assert_eq!(handle.join().await.sources_completed, 3);
    Ok(())
}

#[tokio::test]
async fn test_reader_dropped_mid_flight_abandons_sources() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = muxer::bounded(1);
    let sources = vec![paced((0..100).collect(), Duration::from_millis(1)), never_ending()];

    // Act
    let handle = multiplex(tx.clone(), sources)?;
    let first = rx.recv().await?;
    drop(rx);
    let closed = tokio::time::timeout(Duration::from_millis(200), handle.closed()).await;

    // Assert
    assert_eq!(first, 0);
    // the never-ending source only stops when cancelled
    assert!(closed.is_err());
    assert!(Destination::is_closed(&tx));

    handle.cancel();
    let report = tokio::time::timeout(GRACE, handle.join()).await?;
    assert_eq!(report.sources_abandoned, 2);
    Ok(())
}
