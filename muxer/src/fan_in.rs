// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::stream::{FusedStream, SelectAll, Stream};
use muxer_core::{BoxSource, CancellationToken, Cancelled, IntoSource};
use pin_project::pin_project;

/// Poll-driven fan-in of many sources into one stream, without spawning.
///
/// Sources are kept in a readiness queue: only sources whose waker fired
/// are polled again, so the cost of a wakeup does not grow with the number
/// of idle sources. Values from one source keep their order; values from
/// different sources interleave in readiness order.
///
/// The stream ends exactly once, when every source has ended or the
/// cancellation token fires, and stays ended afterwards. Sources still
/// pending at cancellation are dropped with the stream.
///
/// Works on any executor; the only requirement is that the sources' own
/// wakers are driven.
#[pin_project]
pub struct FanIn<T> {
    #[pin]
    sources: SelectAll<BoxSource<T>>,
    cancelled: Option<Cancelled>,
    terminated: bool,
}

impl<T> FanIn<T> {
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSource<T>,
    {
        Self {
            sources: collect_sources(sources),
            cancelled: None,
            terminated: false,
        }
    }

    /// Like [`new`](Self::new), ending early once `token` is cancelled.
    pub fn with_cancellation<I>(sources: I, token: CancellationToken) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSource<T>,
    {
        Self {
            sources: collect_sources(sources),
            cancelled: Some(token.cancelled()),
            terminated: false,
        }
    }

    /// Sources that have not ended yet.
    pub fn remaining(&self) -> usize {
        self.sources.len()
    }
}

fn collect_sources<T, I>(sources: I) -> SelectAll<BoxSource<T>>
where
    I: IntoIterator,
    I::Item: IntoSource<T>,
{
    sources.into_iter().map(IntoSource::<T>::into_source).collect()
}

impl<T> Stream for FanIn<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        if let Some(cancelled) = this.cancelled.as_mut() {
            if Pin::new(cancelled).poll(cx).is_ready() {
                *this.terminated = true;
                return Poll::Ready(None);
            }
        }

        match this.sources.poll_next(cx) {
            Poll::Ready(None) => {
                *this.terminated = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.terminated {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<T> FusedStream for FanIn<T> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Extension trait for fanning a vector of sources into one stream.
pub trait FanInExt {
    type Item;

    /// Merge the sources, ending when all of them have ended.
    fn fan_in(self) -> FanIn<Self::Item>;

    /// Merge the sources, ending early once `token` is cancelled.
    fn fan_in_until(self, token: CancellationToken) -> FanIn<Self::Item>;
}

impl<S> FanInExt for Vec<S>
where
    S: Stream + Send + 'static,
{
    type Item = S::Item;

    fn fan_in(self) -> FanIn<S::Item> {
        FanIn::new(self)
    }

    fn fan_in_until(self, token: CancellationToken) -> FanIn<S::Item> {
        FanIn::with_cancellation(self, token)
    }
}
