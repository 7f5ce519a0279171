// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Relay paths: the per-source (or per-worker) loops that move values from
//! sources into the shared destination.
//!
//! Every source is paired with a [`CompletionGuard`] for the lifetime of its
//! relay. A value is written to the destination before the source is polled
//! again, and the guard is only consumed once the source has ended, so the
//! guard that closes the destination is always released after the last
//! write.

use crate::fan_in::FanIn;
use crate::handle::MuxStatus;
use crate::logging::{debug, info};
use core::marker::PhantomData;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::{Stream, StreamExt};
use muxer_core::{
    BoxSource, CancellationToken, CompletionGuard, CompletionTarget, CompletionTracker,
    Destination, SourceOutcome,
};
use pin_project::pin_project;
use std::sync::Arc;

/// State shared by every relay path of one operation.
pub(crate) struct MuxShared<T, D> {
    destination: D,
    status: Arc<MuxStatus>,
    cancel: CancellationToken,
    _marker: PhantomData<fn(T)>,
}

impl<T, D> MuxShared<T, D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    pub(crate) fn new(destination: D, status: Arc<MuxStatus>, cancel: CancellationToken) -> Self {
        Self {
            destination,
            status,
            cancel,
            _marker: PhantomData,
        }
    }

    async fn deliver(&self, value: T) -> bool {
        match self.destination.send(value).await {
            Ok(()) => {
                self.status.record_value();
                true
            }
            Err(error) => {
                debug!("destination refused value, ending relay path: {}", error);
                false
            }
        }
    }
}

impl<T, D> CompletionTarget for MuxShared<T, D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    fn tracker(&self) -> &CompletionTracker {
        &self.status.tracker
    }

    fn close(&self) {
        self.status.record_close(self.cancel.is_cancelled());
        self.destination.close();
        info!(
            "all {} sources finished after {} values, destination closed",
            self.status.tracker.sources(),
            self.status.values_relayed()
        );
    }

    fn source_finished(&self, outcome: SourceOutcome) {
        self.status.record_outcome(outcome);
    }
}

pub(crate) type Guard<T, D> = CompletionGuard<MuxShared<T, D>>;

/// Drain one source into the destination.
pub(crate) async fn relay_source<T, D>(
    mut source: BoxSource<T>,
    guard: Guard<T, D>,
    cancel: CancellationToken,
) where
    T: Send + 'static,
    D: Destination<T>,
{
    let shared = Arc::clone(guard.target());
    let cancelled = cancel.cancelled();
    tokio::pin!(cancelled);

    loop {
        let next = tokio::select! {
            biased;
            () = &mut cancelled => break,
            next = source.next() => next,
        };

        let Some(value) = next else {
            guard.complete();
            return;
        };

        let delivered = tokio::select! {
            biased;
            () = &mut cancelled => break,
            delivered = shared.deliver(value) => delivered,
        };

        if !delivered {
            break;
        }
    }

    guard.abandon();
}

/// Drain a group of sources through a readiness queue into the destination.
pub(crate) async fn relay_pool<T, D>(
    worker: usize,
    sources: Vec<(BoxSource<T>, Guard<T, D>)>,
    shared: Arc<MuxShared<T, D>>,
    cancel: CancellationToken,
) where
    T: Send + 'static,
    D: Destination<T>,
{
    let count = sources.len();
    let tracked: Vec<BoxSource<T>> = sources
        .into_iter()
        .map(|(source, guard)| Tracked::new(source, guard).boxed())
        .collect();
    let cancelled = cancel.cancelled();
    tokio::pin!(cancelled);
    let mut fan_in = FanIn::with_cancellation(tracked, cancel);

    debug!("pool worker {} started with {} sources", worker, count);

    while let Some(value) = fan_in.next().await {
        let delivered = tokio::select! {
            biased;
            () = &mut cancelled => false,
            delivered = shared.deliver(value) => delivered,
        };

        if !delivered {
            break;
        }
    }

    debug!(
        "pool worker {} finished with {} sources still open",
        worker,
        fan_in.remaining()
    );
}

/// Source wrapper that consumes its guard when the source ends.
///
/// Dropped before the end (worker cancelled or destination gone), the guard
/// goes with it and reports the source as abandoned.
#[pin_project]
struct Tracked<T, D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    source: BoxSource<T>,
    guard: Option<Guard<T, D>>,
}

impl<T, D> Tracked<T, D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    fn new(source: BoxSource<T>, guard: Guard<T, D>) -> Self {
        Self {
            source,
            guard: Some(guard),
        }
    }
}

impl<T, D> Stream for Tracked<T, D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.project();
        let polled = this.source.as_mut().poll_next(cx);

        if let Poll::Ready(None) = polled {
            if let Some(guard) = this.guard.take() {
                guard.complete();
            }
        }

        polled
    }
}
