// src/utils/errors.rs
//! Error types for the traffic relay SDK
//!
//! The capture path is deliberately infallible; errors exist only at the
//! lifecycle and delivery seams, and delivery errors never propagate past
//! the relay worker.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors surfaced by the relay pipeline
#[derive(Error, Debug)]
pub enum RelayError {
    /// `start` was called on a pipeline that already has a live worker
    #[error("relay pipeline already started")]
    AlreadyStarted,

    /// The broker rejected or failed a delivery attempt
    #[error("broker delivery failed: {0}")]
    DeliveryFailed(String),

    /// A record could not be serialized to its wire form
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
