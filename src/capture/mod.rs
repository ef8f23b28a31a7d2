// src/capture/mod.rs
//! Exchange capture and record building
//!
//! This module turns one observed HTTP exchange into one broker-ready record:
//!
//! - **Exchange**: `RequestData`/`ResponseData` input types filled in by the
//!   host HTTP layer
//! - **Record**: The builder that derives the structured wire record,
//!   including the optional `latency_ms` field
//!
//! Building a record is total: missing fields stay empty, unknown timing is
//! expressed by omitting `latency_ms` rather than reporting zero.

pub mod exchange;
pub mod record;

// Re-export commonly used types
pub use exchange::{monotonic_ns, RequestData, ResponseData};
pub use record::{RecordBuilder, RequestRecord, ResponseRecord, TrafficRecord};
