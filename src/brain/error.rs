//! Error types for the Brain API client.

use std::path::PathBuf;

use thiserror::Error;

/// Failures at the transport and authentication layer.
///
/// Protocol-level classification (rejected vs. pending vs. resolved) is not
/// an error — the submission state machine interprets raw responses.
#[derive(Debug, Error)]
pub enum BrainError {
    /// Missing or malformed credentials artifact. Fatal at startup.
    #[error("cannot load credentials from {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    /// The authentication endpoint refused the credentials. Fatal at startup.
    #[error("authentication rejected (HTTP {status})")]
    AuthRejected { status: u16 },

    /// Underlying network failure (DNS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
