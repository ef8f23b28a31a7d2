// src/utils/mod.rs
//! Common utilities
//!
//! - **config**: Pipeline configuration structs
//! - **errors**: Crate-wide error type and `Result` alias

pub mod config;
pub mod errors;

// Re-export commonly used types
pub use config::{RelayConfig, SdkConfig};
pub use errors::{RelayError, Result};
