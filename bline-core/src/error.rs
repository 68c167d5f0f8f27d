//! Error types for the segmented LED strip.
//!
//! Every fallible operation returns `Result<T, BlineError>`.
//! Pixel access is range-checked instead of panicking.

use std::io;

use thiserror::Error;

/// The canonical error type for bline.
#[derive(Debug, Error)]
pub enum BlineError {
    // ── Setup Errors ─────────────────────────────────────────────
    /// A segment was configured without an address.
    #[error("no address given for segment")]
    Address,

    /// The address/port pair did not resolve to any endpoint.
    #[error("cannot resolve {endpoint}: {source}")]
    Resolution {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The datagram socket could not be bound or connected.
    #[error("cannot connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The segment configuration is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    // ── Frame Errors ─────────────────────────────────────────────
    /// A datagram write to a controller failed.
    #[error("send to segment {segment} ({endpoint}) failed: {source}")]
    Send {
        segment: usize,
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// A pixel index lies outside the configured strip.
    #[error("pixel index {index} out of range (strip has {len} pixels)")]
    IndexOutOfRange { index: usize, len: usize },

    // ── Shutdown Errors ──────────────────────────────────────────
    /// One or more segments failed to close. All failures are kept.
    #[error("{} segment(s) failed to close", .0.len())]
    Close(Vec<CloseFailure>),
}

/// A single segment that did not close cleanly.
#[derive(Debug)]
pub struct CloseFailure {
    pub segment: usize,
    pub endpoint: String,
    pub source: io::Error,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlineError>;

// ── Convenient From implementations ──────────────────────────────

impl From<serde_json::Error> for BlineError {
    fn from(e: serde_json::Error) -> Self {
        BlineError::Config(format!("json: {e}"))
    }
}

impl From<toml::de::Error> for BlineError {
    fn from(e: toml::de::Error) -> Self {
        BlineError::Config(format!("toml: {e}"))
    }
}
