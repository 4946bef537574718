//! Error types shared across the crate.
//!
//! Outcomes fall into four categories:
//!
//! - **Closed**: terminal, reached only by tearing down a channel or event.
//! - **Timeout**: a bounded wait expired; the caller may retry.
//! - **Failure**: a non-blocking attempt could not proceed right now
//!   ([`WouldBlock`]); the caller may retry.
//! - **Internal inconsistency**: a conditional write that the protocol
//!   guarantees must succeed did not. These are bugs and panic with
//!   [`INCONSISTENT_STATE`]; they are never returned as values.
//!
//! Channel-level errors live next to the channel in
//! [`crate::channel::rendezvous`]; primitive-specific errors live in their
//! module under [`crate::sync`].

use std::time::Duration;

/// Panic message for violated internal invariants.
pub(crate) const INCONSISTENT_STATE: &str = "synchronization primitive has inconsistent internal state";

/// A non-blocking acquisition found the primitive busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation would block")]
pub struct WouldBlock;

/// Error returned when configuration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
        /// Parse failure description.
        reason: String,
    },
    /// A poll interval of zero would turn a bounded wait into a spin.
    #[error("{name} must be non-zero, got {interval:?}")]
    ZeroInterval {
        /// Which interval.
        name: &'static str,
        /// The rejected value.
        interval: Duration,
    },
    /// Actor thread names may not be empty.
    #[error("thread name prefix must not be empty")]
    EmptyThreadPrefix,
}
