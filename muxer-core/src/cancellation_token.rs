// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cooperative cancellation for a running fan-in.
//!
//! Relay paths select on [`CancellationToken::cancelled`] next to their
//! source and destination futures, so triggering the token makes every
//! in-flight relay abandon its work at the next suspension point.

use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::{Context, Poll};
use event_listener::{Event, EventListener};
use std::sync::Arc;

/// Shared cancellation flag with async notification.
///
/// Clones share state: cancelling any clone cancels all of them.
///
/// # Example
///
/// ```
/// use muxer_core::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let token = CancellationToken::new();
/// let waiter = token.clone();
///
/// let task = tokio::spawn(async move {
///     waiter.cancelled().await;
/// });
///
/// token.cancel();
/// task.await.unwrap();
/// assert!(token.is_cancelled());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    event: Event,
    parent: Option<CancellationToken>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    ///
    /// The token is initially not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<CancellationToken>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                event: Event::new(),
                parent,
            }),
        }
    }

    /// Create a token that is cancelled whenever `self` is, but can also be
    /// cancelled on its own without affecting `self`.
    ///
    /// # Example
    ///
    /// ```
    /// use muxer_core::CancellationToken;
    ///
    /// let parent = CancellationToken::new();
    /// let child = parent.child_token();
    ///
    /// child.cancel();
    /// assert!(child.is_cancelled());
    /// assert!(!parent.is_cancelled());
    ///
    /// let other = parent.child_token();
    /// parent.cancel();
    /// assert!(other.is_cancelled());
    /// ```
    #[must_use]
    pub fn child_token(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    /// Cancel the token and wake every waiter.
    ///
    /// Idempotent. A parent token is left untouched.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.event.notify(usize::MAX);
        }
    }

    /// Check if the token, or any token it was derived from, has been
    /// cancelled (non-blocking).
    ///
    /// # Example
    ///
    /// ```
    /// use muxer_core::CancellationToken;
    ///
    /// let token = CancellationToken::new();
    /// assert!(!token.is_cancelled());
    ///
    /// token.cancel();
    /// assert!(token.is_cancelled());
    /// ```
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }

    /// Future resolving once the token is cancelled.
    ///
    /// Resolves immediately if the token is already cancelled. The future
    /// owns a handle to the token, so it can be stored in long-lived stream
    /// adapters as well as awaited in place.
    ///
    /// # Example
    ///
    /// ```
    /// use muxer_core::CancellationToken;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let token = CancellationToken::new();
    /// token.cancel();
    /// token.cancelled().await;
    /// # }
    /// ```
    #[must_use]
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
            listener: None,
            parent: self
                .inner
                .parent
                .as_ref()
                .map(|parent| Box::new(parent.cancelled())),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Cancelled {
    token: CancellationToken,
    listener: Option<EventListener>,
    parent: Option<Box<Cancelled>>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if let Some(parent) = self.parent.as_mut() {
            if Pin::new(parent.as_mut()).poll(cx).is_ready() {
                return Poll::Ready(());
            }
        }

        loop {
            if self.token.inner.cancelled.load(Ordering::Acquire) {
                return Poll::Ready(());
            }

            match self.listener.as_mut() {
                None => {
                    // Re-check after registering: cancel() may have run in between
                    let listener = self.token.inner.event.listen();
                    self.listener = Some(listener);
                }
                Some(listener) => {
                    if Pin::new(listener).poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    self.listener = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker;

    #[test]
    fn pending_until_cancelled() {
        let token = CancellationToken::new();
        let mut cancelled = token.cancelled();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut cancelled).poll(&mut cx).is_pending());
        token.cancel();
        assert!(Pin::new(&mut cancelled).poll(&mut cx).is_ready());
    }

    #[test]
    fn child_wakes_on_parent_cancel() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let mut cancelled = child.cancelled();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut cancelled).poll(&mut cx).is_pending());
        parent.cancel();
        assert!(Pin::new(&mut cancelled).poll(&mut cx).is_ready());
    }
}
