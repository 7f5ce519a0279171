// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Building blocks shared by the `muxer` fan-in: the error taxonomy,
//! cooperative cancellation, the completion tracker that decides when the
//! destination closes, and the source/destination abstractions.

pub mod cancellation_token;
pub mod completion_tracker;
pub mod destination;
pub mod error;
mod logging;
pub mod source;

pub use self::cancellation_token::{CancellationToken, Cancelled};
pub use self::completion_tracker::{
    CompletionGuard, CompletionTarget, CompletionTracker, Phase, SourceOutcome,
};
pub use self::destination::{bounded, unbounded, Destination};
pub use self::error::{MuxerError, Result};
pub use self::source::{from_receiver, from_unbounded_receiver, BoxSource, IntoSource, Source};
