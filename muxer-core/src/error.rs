// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the muxer fan-in.
//!
//! Only two things can go wrong from the caller's point of view: the
//! operation was set up incorrectly, which is reported synchronously before
//! any relaying starts, or a destination refused a value, which terminates
//! the relay path that attempted the write and nothing else.
//!
//! # Examples
//!
//! ```
//! use muxer_core::{MuxerError, Result};
//!
//! fn check(sources: usize) -> Result<()> {
//!     if sources == 0 {
//!         return Err(MuxerError::configuration("at least one source is required"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(0).unwrap_err().is_configuration());
//! ```

/// Root error type for all muxer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MuxerError {
    /// The operation could not be started.
    ///
    /// Raised for an empty source set, a missing or already-closed
    /// destination, an invalid configuration or a missing async runtime.
    /// No background work exists when this is returned.
    #[error("Configuration error: {context}")]
    Configuration {
        /// What was wrong with the requested operation
        context: String,
    },

    /// The destination no longer accepts values.
    #[error("Destination closed")]
    DestinationClosed,
}

impl MuxerError {
    /// Create a configuration error with the given context
    pub fn configuration(context: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
        }
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    #[must_use]
    pub const fn is_destination_closed(&self) -> bool {
        matches!(self, Self::DestinationClosed)
    }
}

/// Specialized Result type for muxer operations.
pub type Result<T> = core::result::Result<T, MuxerError>;
