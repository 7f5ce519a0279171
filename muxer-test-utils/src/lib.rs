// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the muxer fan-in.
//!
//! Designed for tests and benchmarks only, not production code.
//!
//! # Key Types
//!
//! ## Synthetic sources
//!
//! [`sources`] builds producers that behave like real workers: a value after
//! a fixed or random delay, a worst-case worker that always takes the full
//! delay, sources that never finish, sources that panic mid-stream.
//!
//! ```rust
//! use muxer_test_utils::sources::{values, workload};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! // 99 workers with a random delay plus one worst-case worker
//! let jobs = workload(100, Duration::from_millis(1), Duration::from_millis(10));
//! assert_eq!(jobs.len(), 100);
//!
//! let plain = values(vec![1, 2, 3]);
//! # drop(plain);
//! # }
//! ```
//!
//! ## RecordingDestination
//!
//! A [`Destination`](muxer_core::Destination) that records every value and
//! counts close calls, so tests can assert "closed exactly once" and "nothing
//! written after close" directly.
//!
//! ```rust
//! use muxer_core::Destination;
//! use muxer_test_utils::RecordingDestination;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let destination = RecordingDestination::new();
//! destination.send(1).await.unwrap();
//! destination.close();
//!
//! assert_eq!(destination.values(), vec![1]);
//! assert_eq!(destination.close_count(), 1);
//! # }
//! ```
//!
//! # Module Organization
//!
//! - `sources` - synthetic producers
//! - `recording_destination` - close-counting destination double
//! - `helpers` - draining and multiset/order assertions

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod helpers;
pub mod recording_destination;
pub mod sources;

pub use helpers::{assert_in_relative_order, assert_same_multiset, drain_within};
pub use recording_destination::RecordingDestination;
