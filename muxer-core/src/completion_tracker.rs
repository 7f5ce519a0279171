// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Collective completion of a fixed set of sources.
//!
//! A [`CompletionTracker`] is created with the number of registered sources
//! and moves through an explicit terminal state machine:
//!
//! ```text
//! Active { remaining: N } --last mark_done--> Active { remaining: 0 }
//!                         --begin_close-----> Closing
//!                         --finish_close----> Closed
//! ```
//!
//! `mark_done` returns `true` to exactly one caller, and `begin_close`
//! succeeds exactly once, so the destination is closed exactly once no
//! matter how many sources finish at the same instant.
//!
//! [`CompletionGuard`] binds one source's completion to a value: it is
//! consumed when the source ends and reports an abandonment when dropped
//! unconsumed, so a cancelled or panicking relay still counts down.

use crate::logging::{debug, warn};
use crate::{MuxerError, Result};
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use event_listener::Event;
use std::sync::Arc;

const ACTIVE: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Observable state of a [`CompletionTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Sources are still outstanding, or the last one just finished and
    /// nobody has started closing yet.
    Active { remaining: usize },
    /// The destination is being closed.
    Closing,
    /// The destination has been closed.
    Closed,
}

/// Atomic countdown over the registered sources.
#[derive(Debug)]
pub struct CompletionTracker {
    sources: usize,
    remaining: AtomicUsize,
    phase: AtomicU8,
    closed: Event,
}

impl CompletionTracker {
    /// Create a tracker for `sources` registered sources.
    ///
    /// # Errors
    /// Returns [`MuxerError::Configuration`] when `sources` is zero.
    pub fn new(sources: usize) -> Result<Self> {
        if sources == 0 {
            return Err(MuxerError::configuration(
                "completion tracker requires at least one source",
            ));
        }

        Ok(Self {
            sources,
            remaining: AtomicUsize::new(sources),
            phase: AtomicU8::new(ACTIVE),
            closed: Event::new(),
        })
    }

    /// Number of sources registered at construction.
    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Record that one source finished.
    ///
    /// Returns `true` only to the caller that moved the count from one to
    /// zero. Calls made once the count is already zero are duplicate
    /// completion signals: they are logged and return `false`.
    pub fn mark_done(&self) -> bool {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous == 1,
            Err(_) => {
                warn!(
                    "duplicate completion signal ignored: all {} sources already finished",
                    self.sources
                );
                false
            }
        }
    }

    /// Claim the right to close the destination.
    ///
    /// Succeeds once, and only after every source has finished.
    pub fn begin_close(&self) -> bool {
        if self.remaining() != 0 {
            return false;
        }

        self.phase
            .compare_exchange(ACTIVE, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Publish the closed state and wake everyone waiting in [`closed`](Self::closed).
    pub fn finish_close(&self) {
        if self
            .phase
            .compare_exchange(CLOSING, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!("completion tracker closed after {} sources", self.sources);
            self.closed.notify(usize::MAX);
        }
    }

    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            ACTIVE => Phase::Active {
                remaining: self.remaining(),
            },
            CLOSING => Phase::Closing,
            _ => Phase::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.phase.load(Ordering::Acquire) == CLOSED
    }

    /// Wait until the tracker reaches [`Phase::Closed`].
    pub async fn closed(&self) {
        loop {
            if self.is_closed() {
                return;
            }

            let listener = self.closed.listen();

            if self.is_closed() {
                return;
            }

            listener.await;
        }
    }
}

/// How a source's relay path ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The source signalled end-of-stream and all its values were relayed.
    Completed,
    /// The relay path stopped early: cancellation, a destination that
    /// refused a value, a panic, or a source that was never scheduled.
    Abandoned,
}

/// Owner of a tracker plus the authority to close the destination it guards.
pub trait CompletionTarget: Send + Sync + 'static {
    fn tracker(&self) -> &CompletionTracker;

    /// Close the destination. Called exactly once, by the last guard.
    fn close(&self);

    /// Hook invoked once per source before it is counted down.
    fn source_finished(&self, _outcome: SourceOutcome) {}
}

/// Per-source completion token.
///
/// Consuming it with [`complete`](Self::complete) or
/// [`abandon`](Self::abandon) counts the source down. Dropping it without
/// consuming counts as [`SourceOutcome::Abandoned`].
#[derive(Debug)]
pub struct CompletionGuard<C: CompletionTarget> {
    target: Arc<C>,
    finished: bool,
}

impl<C: CompletionTarget> CompletionGuard<C> {
    pub fn new(target: Arc<C>) -> Self {
        Self {
            target,
            finished: false,
        }
    }

    pub fn target(&self) -> &Arc<C> {
        &self.target
    }

    /// The source ended normally. Returns `true` if this guard closed the destination.
    pub fn complete(mut self) -> bool {
        self.finish(SourceOutcome::Completed)
    }

    /// The relay path gave up on the source. Returns `true` if this guard closed the destination.
    pub fn abandon(mut self) -> bool {
        self.finish(SourceOutcome::Abandoned)
    }

    fn finish(&mut self, outcome: SourceOutcome) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;

        self.target.source_finished(outcome);

        let tracker = self.target.tracker();
        if tracker.mark_done() && tracker.begin_close() {
            self.target.close();
            tracker.finish_close();
            return true;
        }

        false
    }
}

impl<C: CompletionTarget> Drop for CompletionGuard<C> {
    fn drop(&mut self) {
        self.finish(SourceOutcome::Abandoned);
    }
}
