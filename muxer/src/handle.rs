// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use muxer_core::{CancellationToken, CompletionTracker, Phase, SourceOutcome};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters and completion state of one operation, shared by its relay
/// paths and its handle.
#[derive(Debug)]
pub(crate) struct MuxStatus {
    pub(crate) tracker: CompletionTracker,
    values_relayed: AtomicU64,
    sources_completed: AtomicUsize,
    sources_abandoned: AtomicUsize,
    cancelled_before_close: AtomicBool,
}

impl MuxStatus {
    pub(crate) fn new(tracker: CompletionTracker) -> Self {
        Self {
            tracker,
            values_relayed: AtomicU64::new(0),
            sources_completed: AtomicUsize::new(0),
            sources_abandoned: AtomicUsize::new(0),
            cancelled_before_close: AtomicBool::new(false),
        }
    }

    /// Called once, right before the destination is closed. The tracker
    /// publishes `Closed` afterwards, so readers that observe it see this flag.
    pub(crate) fn record_close(&self, cancelled: bool) {
        self.cancelled_before_close.store(cancelled, Ordering::Release);
    }

    pub(crate) fn record_value(&self) {
        self.values_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: SourceOutcome) {
        let counter = match outcome {
            SourceOutcome::Completed => &self.sources_completed,
            SourceOutcome::Abandoned => &self.sources_abandoned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn values_relayed(&self) -> u64 {
        self.values_relayed.load(Ordering::Relaxed)
    }
}

/// Summary of a multiplexing operation.
///
/// Final once the destination has closed: `sources_completed +
/// sources_abandoned == sources`, and `cancelled` tells whether the
/// operation was cancelled before it closed. Cancelling afterwards does not
/// change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxReport {
    pub sources: usize,
    pub values_relayed: u64,
    pub sources_completed: usize,
    pub sources_abandoned: usize,
    pub cancelled: bool,
}

/// Handle to a running multiplexing operation.
///
/// Dropping the handle detaches it; relaying continues in the background.
#[derive(Debug, Clone)]
pub struct MuxHandle {
    status: Arc<MuxStatus>,
    cancel: CancellationToken,
}

impl MuxHandle {
    pub(crate) fn new(status: Arc<MuxStatus>, cancel: CancellationToken) -> Self {
        Self { status, cancel }
    }

    /// Stop relaying. In-flight values are abandoned and the destination
    /// still closes exactly once.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether this operation has been cancelled, through [`cancel`](Self::cancel),
    /// an elapsed deadline or the caller's token.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the destination has been closed.
    pub fn is_closed(&self) -> bool {
        self.status.tracker.is_closed()
    }

    /// Current [`Phase`] of the operation.
    pub fn phase(&self) -> Phase {
        self.status.tracker.phase()
    }

    /// Wait until the destination has been closed.
    pub async fn closed(&self) {
        self.status.tracker.closed().await;
    }

    /// Wait for the destination to close and return the final report.
    pub async fn join(self) -> MuxReport {
        self.closed().await;
        self.report()
    }

    /// Snapshot of the counters so far; final once the destination has closed.
    pub fn report(&self) -> MuxReport {
        let cancelled = if self.status.tracker.is_closed() {
            self.status.cancelled_before_close.load(Ordering::Acquire)
        } else {
            self.cancel.is_cancelled()
        };

        MuxReport {
            sources: self.status.tracker.sources(),
            values_relayed: self.status.values_relayed(),
            sources_completed: self.status.sources_completed.load(Ordering::Relaxed),
            sources_abandoned: self.status.sources_abandoned.load(Ordering::Relaxed),
            cancelled,
        }
    }
}
