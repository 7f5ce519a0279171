// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Producers as seen by the multiplexer.
//!
//! A source is any `Stream` that yields a finite sequence of values and
//! then ends. The multiplexer only polls it; whatever drives the values
//! (a timer, a spawned computation, a test double) stays with the caller.

use core::pin::Pin;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

/// Type-erased source.
pub type BoxSource<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// Capability of producing a lazy, finite sequence of values and then ending.
pub trait Source<T>: Stream<Item = T> + Send + 'static {}

impl<T, S> Source<T> for S where S: Stream<Item = T> + Send + 'static {}

/// Conversion into a [`BoxSource`].
pub trait IntoSource<T> {
    fn into_source(self) -> BoxSource<T>;
}

impl<T, S> IntoSource<T> for S
where
    S: Source<T>,
{
    fn into_source(self) -> BoxSource<T> {
        self.boxed()
    }
}

/// Source draining a bounded tokio channel until every sender is dropped.
pub fn from_receiver<T: Send + 'static>(receiver: mpsc::Receiver<T>) -> BoxSource<T> {
    ReceiverStream::new(receiver).boxed()
}

/// Source draining an unbounded tokio channel until every sender is dropped.
pub fn from_unbounded_receiver<T: Send + 'static>(
    receiver: mpsc::UnboundedReceiver<T>,
) -> BoxSource<T> {
    UnboundedReceiverStream::new(receiver).boxed()
}
