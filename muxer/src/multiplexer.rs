// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::{MuxConfig, RelayStrategy};
use crate::handle::{MuxHandle, MuxStatus};
use crate::logging::{debug, info, warn};
use crate::relay::{relay_pool, relay_source, Guard, MuxShared};
use muxer_core::{
    BoxSource, CancellationToken, CompletionGuard, CompletionTracker, Destination, IntoSource,
    MuxerError, Result,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

/// Merge every value of every source into `destination`, closing it once
/// all sources have ended.
///
/// Relaying runs in the background on the current tokio runtime; the
/// returned [`MuxHandle`] can cancel it or wait for it to finish.
///
/// # Errors
/// Returns [`MuxerError::Configuration`], with nothing started, when
/// `sources` is empty, `destination` is already closed, or there is no
/// tokio runtime.
///
/// # Example
///
/// ```
/// use futures::{stream, StreamExt};
///
/// # #[tokio::main]
/// # async fn main() -> muxer::Result<()> {
/// let (tx, rx) = muxer::unbounded();
///
/// let handle = muxer::multiplex(
///     tx,
///     vec![stream::iter(vec![1]), stream::iter(vec![2, 3]), stream::iter(vec![])],
/// )?;
///
/// let mut values = rx.collect::<Vec<_>>().await;
/// values.sort();
/// assert_eq!(values, vec![1, 2, 3]);
/// assert_eq!(handle.join().await.sources_completed, 3);
/// # Ok(())
/// # }
/// ```
pub fn multiplex<T, D, I>(destination: D, sources: I) -> Result<MuxHandle>
where
    T: Send + 'static,
    D: Destination<T>,
    I: IntoIterator,
    I::Item: IntoSource<T>,
{
    Multiplexer::new()
        .destination(destination)
        .sources(sources)
        .start()
}

/// Builder for a multiplexing operation.
///
/// ```
/// use muxer::{MuxConfig, Multiplexer};
/// use muxer_core::CancellationToken;
/// use futures::{stream, StreamExt};
/// use std::num::NonZeroUsize;
///
/// # #[tokio::main]
/// # async fn main() -> muxer::Result<()> {
/// let (tx, rx) = muxer::bounded(16);
/// let token = CancellationToken::new();
///
/// let handle = Multiplexer::new()
///     .config(MuxConfig::default().pooled(NonZeroUsize::new(4).unwrap()))
///     .cancellation_token(token.clone())
///     .sources((0..100).map(|i| stream::iter(vec![i])))
///     .destination(tx)
///     .start()?;
///
/// assert_eq!(rx.count().await, 100);
/// assert_eq!(handle.join().await.values_relayed, 100);
/// # Ok(())
/// # }
/// ```
pub struct Multiplexer<T, D> {
    destination: Option<D>,
    sources: Vec<BoxSource<T>>,
    config: MuxConfig,
    cancellation_token: Option<CancellationToken>,
}

impl<T, D> Default for Multiplexer<T, D> {
    fn default() -> Self {
        Self {
            destination: None,
            sources: Vec::new(),
            config: MuxConfig::default(),
            cancellation_token: None,
        }
    }
}

impl<T, D> Multiplexer<T, D>
where
    T: Send + 'static,
    D: Destination<T>,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn destination(mut self, destination: D) -> Self {
        self.destination = Some(destination);
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl IntoSource<T>) -> Self {
        self.sources.push(source.into_source());
        self
    }

    #[must_use]
    pub fn sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSource<T>,
    {
        self.sources
            .extend(sources.into_iter().map(IntoSource::<T>::into_source));
        self
    }

    #[must_use]
    pub fn config(mut self, config: MuxConfig) -> Self {
        self.config = config;
        self
    }

    /// Cancel relaying when `token` is cancelled.
    ///
    /// The operation only listens to `token`: [`MuxHandle::cancel`] and an
    /// elapsed deadline stop this operation without cancelling `token`.
    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Validate the registration and start relaying in the background.
    ///
    /// # Errors
    /// Returns [`MuxerError::Configuration`] when no source was registered,
    /// the destination is missing or already closed, the configuration is
    /// invalid, or there is no tokio runtime. Nothing is started on error.
    pub fn start(self) -> Result<MuxHandle> {
        let Self {
            destination,
            sources,
            config,
            cancellation_token,
        } = self;

        if sources.is_empty() {
            return Err(MuxerError::configuration("at least one source is required"));
        }

        let destination =
            destination.ok_or_else(|| MuxerError::configuration("a destination is required"))?;

        if destination.is_closed() {
            return Err(MuxerError::configuration("destination is already closed"));
        }

        config.validate()?;

        let runtime = Handle::try_current().map_err(|_| {
            MuxerError::configuration("multiplexing must be started inside a tokio runtime")
        })?;

        let count = sources.len();
        let status = Arc::new(MuxStatus::new(CompletionTracker::new(count)?));
        // Per-operation token: the deadline and the handle cancel only this operation
        let cancel = match cancellation_token {
            Some(external) => external.child_token(),
            None => CancellationToken::new(),
        };
        let shared = Arc::new(MuxShared::new(
            destination,
            Arc::clone(&status),
            cancel.clone(),
        ));

        let relays: Vec<(BoxSource<T>, Guard<T, D>)> = sources
            .into_iter()
            .map(|source| (source, CompletionGuard::new(Arc::clone(&shared))))
            .collect();

        info!("multiplex started: {} sources, {:?}", count, config.strategy());

        match config.strategy() {
            RelayStrategy::PerSource => match config.concurrency_limit() {
                None => spawn_per_source(&runtime, relays, &cancel),
                Some(limit) => {
                    runtime.spawn(dispatch_limited(relays, limit, cancel.clone()));
                }
            },
            RelayStrategy::Pooled { workers } => {
                spawn_pooled(&runtime, relays, workers, &shared, &cancel);
            }
        }

        if let Some(deadline) = config.configured_deadline() {
            runtime.spawn(watchdog(deadline, Arc::clone(&status), cancel.clone()));
        }

        Ok(MuxHandle::new(status, cancel))
    }
}

fn spawn_per_source<T, D>(
    runtime: &Handle,
    relays: Vec<(BoxSource<T>, Guard<T, D>)>,
    cancel: &CancellationToken,
) where
    T: Send + 'static,
    D: Destination<T>,
{
    for (source, guard) in relays {
        if cancel.is_cancelled() {
            debug!("cancelled while spawning relays, abandoning the rest");
            break;
        }
        runtime.spawn(relay_source(source, guard, cancel.clone()));
    }
}

async fn dispatch_limited<T, D>(
    relays: Vec<(BoxSource<T>, Guard<T, D>)>,
    limit: NonZeroUsize,
    cancel: CancellationToken,
) where
    T: Send + 'static,
    D: Destination<T>,
{
    let permits = Arc::new(Semaphore::new(limit.get()));

    for (source, guard) in relays {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => permit,
        };

        let Ok(permit) = permit else {
            break;
        };

        let cancel = cancel.clone();
        tokio::spawn(async move {
            relay_source(source, guard, cancel).await;
            drop(permit);
        });
    }
}

fn spawn_pooled<T, D>(
    runtime: &Handle,
    relays: Vec<(BoxSource<T>, Guard<T, D>)>,
    workers: NonZeroUsize,
    shared: &Arc<MuxShared<T, D>>,
    cancel: &CancellationToken,
) where
    T: Send + 'static,
    D: Destination<T>,
{
    let workers = workers.get().min(relays.len());
    let mut groups: Vec<Vec<_>> = (0..workers).map(|_| Vec::new()).collect();
    for (index, relay) in relays.into_iter().enumerate() {
        groups[index % workers].push(relay);
    }

    for (worker, group) in groups.into_iter().enumerate() {
        runtime.spawn(relay_pool(
            worker,
            group,
            Arc::clone(shared),
            cancel.clone(),
        ));
    }
}

async fn watchdog(deadline: Duration, status: Arc<MuxStatus>, cancel: CancellationToken) {
    tokio::select! {
        () = status.tracker.closed() => {}
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(deadline) => {
            warn!(
                "deadline of {:?} elapsed with {} sources outstanding, cancelling",
                deadline,
                status.tracker.remaining()
            );
            cancel.cancel();
        }
    }
}
