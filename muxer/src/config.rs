// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use muxer_core::{MuxerError, Result};
use std::num::NonZeroUsize;
use std::time::Duration;

/// How relay paths are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayStrategy {
    /// One tokio task per source.
    ///
    /// Tasks are cheap enough for tens of thousands of sources. Combine with
    /// [`MuxConfig::max_concurrent_relays`] to cap how many run at once.
    #[default]
    PerSource,

    /// A fixed number of worker tasks, each draining a readiness queue over
    /// its share of the sources (assigned round-robin).
    Pooled { workers: NonZeroUsize },
}

/// Options for a multiplexing operation.
///
/// ```
/// use muxer::{MuxConfig, RelayStrategy};
/// use std::num::NonZeroUsize;
/// use std::time::Duration;
///
/// let config = MuxConfig::default()
///     .max_concurrent_relays(NonZeroUsize::new(64).unwrap())
///     .deadline(Duration::from_secs(5));
/// assert_eq!(config.strategy(), RelayStrategy::PerSource);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuxConfig {
    strategy: RelayStrategy,
    max_concurrent_relays: Option<NonZeroUsize>,
    deadline: Option<Duration>,
}

impl MuxConfig {
    /// Select how relay paths are scheduled.
    #[must_use]
    pub fn with_strategy(mut self, strategy: RelayStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shorthand for [`RelayStrategy::Pooled`].
    #[must_use]
    pub fn pooled(self, workers: NonZeroUsize) -> Self {
        self.with_strategy(RelayStrategy::Pooled { workers })
    }

    /// Upper bound on relay tasks running at once under
    /// [`RelayStrategy::PerSource`]. Sources beyond the bound wait for a
    /// running relay to finish before they are polled at all.
    #[must_use]
    pub fn max_concurrent_relays(mut self, limit: NonZeroUsize) -> Self {
        self.max_concurrent_relays = Some(limit);
        self
    }

    /// Cancel the operation if the destination has not closed within `deadline`.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The configured [`RelayStrategy`].
    pub fn strategy(&self) -> RelayStrategy {
        self.strategy
    }

    /// Bound set by [`max_concurrent_relays`](Self::max_concurrent_relays), if any.
    pub fn concurrency_limit(&self) -> Option<NonZeroUsize> {
        self.max_concurrent_relays
    }

    /// Deadline set by [`deadline`](Self::deadline), if any.
    pub fn configured_deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(MuxerError::configuration("deadline must be greater than zero"));
        }

        if self.max_concurrent_relays.is_some() && self.strategy != RelayStrategy::PerSource {
            return Err(MuxerError::configuration(
                "max_concurrent_relays only applies to the per-source strategy",
            ));
        }

        Ok(())
    }
}
