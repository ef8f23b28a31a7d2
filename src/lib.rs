// src/lib.rs
//! Traffic Relay SDK
//!
//! An embeddable pipeline that captures HTTP request/response pairs observed
//! by a host server, serializes each as a structured record, and relays the
//! records to a message broker with bounded, time- and size-based batching.
//!
//! # Architecture
//!
//! The crate is structured into three key modules:
//!
//! - **capture**: Exchange input types and the record builder
//! - **relay**: Ingestion queue, batching relay worker, pipeline lifecycle
//! - **broker**: The broker client capability and in-tree implementations
//!
//! Data flows in one direction:
//!
//! ```text
//! caller → capture() → Ingestion Queue → Relay Worker → Broker Client
//! ```
//!
//! The pipeline is an explicitly constructed, explicitly owned object; there
//! is no process-wide singleton. Hand a [`CaptureHandle`] to the HTTP layer
//! and keep the [`TrafficPipeline`] wherever the application manages
//! lifecycle.

// Public module exports
pub mod broker;
pub mod capture;
pub mod relay;
pub mod utils;

// Re-export commonly used types
pub use broker::{BrokerClient, LogBroker, MemoryBroker};
pub use capture::exchange::{monotonic_ns, RequestData, ResponseData};
pub use capture::record::{RecordBuilder, TrafficRecord};
pub use relay::pipeline::{CaptureHandle, RelayStats, TrafficPipeline};
pub use utils::config::{RelayConfig, SdkConfig};
pub use utils::errors::{RelayError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
