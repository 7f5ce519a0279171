// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{MuxerError, Result};
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedSender;
use std::sync::Arc;

/// Write-and-close sink receiving the merged values.
///
/// A destination is shared by every relay path of an operation, so all
/// methods take `&self`. The caller keeps the reading end; the multiplexer
/// only writes and, once every source has finished, closes.
///
/// `send` may suspend while a bounded destination applies backpressure.
#[async_trait]
pub trait Destination<T: Send + 'static>: Send + Sync + 'static {
    /// Deliver one value.
    ///
    /// # Errors
    /// Returns [`MuxerError::DestinationClosed`] when the destination no
    /// longer accepts values.
    async fn send(&self, value: T) -> Result<()>;

    /// Close the destination. Readers observe end-of-stream once buffered
    /// values are drained.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

#[async_trait]
impl<T: Send + 'static> Destination<T> for async_channel::Sender<T> {
    async fn send(&self, value: T) -> Result<()> {
        async_channel::Sender::send(self, value)
            .await
            .map_err(|_| MuxerError::DestinationClosed)
    }

    fn close(&self) {
        async_channel::Sender::close(self);
    }

    fn is_closed(&self) -> bool {
        async_channel::Sender::is_closed(self)
    }
}

#[async_trait]
impl<T: Send + 'static> Destination<T> for UnboundedSender<T> {
    async fn send(&self, value: T) -> Result<()> {
        self.unbounded_send(value)
            .map_err(|_| MuxerError::DestinationClosed)
    }

    fn close(&self) {
        self.close_channel();
    }

    fn is_closed(&self) -> bool {
        UnboundedSender::is_closed(self)
    }
}

#[async_trait]
impl<T, D> Destination<T> for Arc<D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    async fn send(&self, value: T) -> Result<()> {
        (**self).send(value).await
    }

    fn close(&self) {
        (**self).close();
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Bounded destination backed by `async-channel`.
///
/// A capacity of zero is rounded up to one.
pub fn bounded<T>(capacity: usize) -> (async_channel::Sender<T>, async_channel::Receiver<T>) {
    async_channel::bounded(capacity.max(1))
}

/// Unbounded destination backed by `async-channel`.
pub fn unbounded<T>() -> (async_channel::Sender<T>, async_channel::Receiver<T>) {
    async_channel::unbounded()
}
