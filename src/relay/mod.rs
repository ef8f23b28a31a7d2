// src/relay/mod.rs
//! Record ingestion and batched relay
//!
//! This module carries records from capture to delivery:
//!
//! - **Queue**: Unbounded multi-producer handoff between request threads and
//!   the relay worker
//! - **Worker**: Single background task batching records and flushing them to
//!   the broker on count or time thresholds
//! - **Pipeline**: Lifecycle controller owning queue, worker, and broker
//!
//! # Delivery semantics
//!
//! Records are delivered to the broker in FIFO enqueue order, within and
//! across batches. Each batch gets at most one delivery attempt: a broker
//! failure is logged, the batch is dropped, and the worker moves on. Shutdown
//! drains every record enqueued before `stop()` and attempts one bounded
//! final flush.

pub mod pipeline;
pub mod queue;
pub(crate) mod worker;

// Re-export commonly used types
pub use pipeline::{CaptureHandle, RelayStats, TrafficPipeline};
pub use queue::{QueueStats, RecordQueue};
