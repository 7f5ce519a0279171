// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use muxer_core::{Destination, MuxerError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Destination double that records values and close calls.
///
/// Writes that arrive after `close` are counted in
/// [`sends_after_close`](Self::sends_after_close) and rejected.
#[derive(Debug)]
pub struct RecordingDestination<T> {
    values: Mutex<Vec<T>>,
    closed: AtomicBool,
    close_count: AtomicUsize,
    sends_after_close: AtomicUsize,
    send_delay: Option<Duration>,
    fail_after: Option<usize>,
}

impl<T> RecordingDestination<T> {
    pub fn new() -> Arc<Self> {
        Self::build(None, None)
    }

    /// Every send waits `delay` first, simulating a slow consumer.
    pub fn with_send_delay(delay: Duration) -> Arc<Self> {
        Self::build(Some(delay), None)
    }

    /// Accepts `limit` values, then rejects every further send.
    pub fn failing_after(limit: usize) -> Arc<Self> {
        Self::build(None, Some(limit))
    }

    fn build(send_delay: Option<Duration>, fail_after: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
            sends_after_close: AtomicUsize::new(0),
            send_delay,
            fail_after,
        })
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn sends_after_close(&self) -> usize {
        self.sends_after_close.load(Ordering::SeqCst)
    }
}

impl<T: Clone> RecordingDestination<T> {
    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }
}

#[async_trait]
impl<T: Send + 'static> Destination<T> for RecordingDestination<T> {
    async fn send(&self, value: T) -> Result<()> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        if self.closed.load(Ordering::SeqCst) {
            self.sends_after_close.fetch_add(1, Ordering::SeqCst);
            return Err(MuxerError::DestinationClosed);
        }

        let mut values = self.values.lock();
        if self.fail_after.is_some_and(|limit| values.len() >= limit) {
            return Err(MuxerError::DestinationClosed);
        }
        values.push(value);
        Ok(())
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
