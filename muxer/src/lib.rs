// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Many-to-one fan-in of finite async sources.
//!
//! [`multiplex`] relays every value of every source into a single
//! [`Destination`] and closes it exactly once, when the last source has
//! ended. No order is promised across sources; each source's own values are
//! relayed in the order it produced them.
//!
//! Two ways to consume a set of sources:
//!
//! - [`multiplex`] / [`Multiplexer`]: background relaying into a destination
//!   the caller reads from, with cancellation, a deadline and a choice of
//!   [`RelayStrategy`].
//! - [`FanIn`] / [`FanInExt`]: a plain `Stream` that merges the sources when
//!   polled, for callers that want to drive the merge themselves.
//!
//! A source that never ends keeps the destination open forever; bound the
//! wait with [`MuxConfig::deadline`] or a [`CancellationToken`].

pub mod config;
pub mod fan_in;
pub mod handle;
mod logging;
pub mod multiplexer;
mod relay;

pub use self::config::{MuxConfig, RelayStrategy};
pub use self::fan_in::{FanIn, FanInExt};
pub use self::handle::{MuxHandle, MuxReport};
pub use self::multiplexer::{multiplex, Multiplexer};
pub use muxer_core::{
    bounded, unbounded, BoxSource, CancellationToken, Destination, IntoSource, MuxerError, Phase,
    Result, Source,
};
