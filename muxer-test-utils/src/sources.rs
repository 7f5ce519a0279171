// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{self, StreamExt};
use muxer_core::BoxSource;
use std::time::Duration;
use tokio::time::sleep;

/// Lower bound of the random worker delay used by the scaling benchmarks.
pub const MIN_DELAY: Duration = Duration::from_millis(100);
/// Upper bound of the random worker delay, and the worst-case worker delay.
pub const MAX_DELAY: Duration = Duration::from_millis(1000);

/// Emits each value immediately, then ends.
pub fn values<T: Send + 'static>(items: Vec<T>) -> BoxSource<T> {
    stream::iter(items).boxed()
}

/// Ends without emitting anything.
pub fn empty<T: Send + 'static>() -> BoxSource<T> {
    stream::empty().boxed()
}

/// Never emits and never ends.
pub fn never_ending<T: Send + 'static>() -> BoxSource<T> {
    stream::pending().boxed()
}

/// Emits `value` once `delay` has elapsed since the first poll.
pub fn delayed<T: Send + 'static>(value: T, delay: Duration) -> BoxSource<T> {
    stream::once(async move {
        sleep(delay).await;
        value
    })
    .boxed()
}

/// Emits the items one by one, waiting `interval` before each.
pub fn paced<T: Send + 'static>(items: Vec<T>, interval: Duration) -> BoxSource<T> {
    stream::iter(items)
        .then(move |item| async move {
            sleep(interval).await;
            item
        })
        .boxed()
}

/// Emits the items, then panics instead of ending.
pub fn panicking<T: Send + 'static>(items: Vec<T>) -> BoxSource<T> {
    stream::iter(items)
        .chain(stream::poll_fn(|_| -> std::task::Poll<Option<T>> {
            panic!("source panicked after its last value")
        }))
        .boxed()
}

/// Background worker: sleeps a uniformly random duration in `[min, max)`,
/// then yields the duration it slept.
///
/// The worker is spawned immediately, so its clock runs whether or not the
/// returned source is being polled. Must be called inside a tokio runtime.
pub fn worker(min: Duration, max: Duration) -> BoxSource<Duration> {
    let min_ms = min.as_millis() as u64;
    let max_ms = (max.as_millis() as u64).max(min_ms + 1);
    spawn_worker(Duration::from_millis(fastrand::u64(min_ms..max_ms)))
}

/// Background worker that always takes the full `max` delay.
pub fn worst_case_worker(max: Duration) -> BoxSource<Duration> {
    spawn_worker(max)
}

/// `jobs - 1` random [`worker`]s plus one [`worst_case_worker`].
pub fn workload(jobs: usize, min: Duration, max: Duration) -> Vec<BoxSource<Duration>> {
    let mut sources: Vec<_> = (1..jobs).map(|_| worker(min, max)).collect();
    if jobs > 0 {
        sources.push(worst_case_worker(max));
    }
    sources
}

fn spawn_worker(delay: Duration) -> BoxSource<Duration> {
    let (tx, rx) = async_channel::bounded(1);
    tokio::spawn(async move {
        sleep(delay).await;
        let _ = tx.send(delay).await;
    });
    rx.boxed()
}
