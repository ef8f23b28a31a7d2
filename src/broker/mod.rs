// src/broker/mod.rs
//! Broker client capability
//!
//! The relay treats the broker as an opaque delivery capability: it hands
//! over serialized records and observes success or failure, nothing more.
//! Wire protocol, connection management, and broker-side configuration
//! (address, topic, compression, acks) live entirely inside the
//! implementation. Two implementations ship in-tree:
//!
//! - **LogBroker**: writes every record to the tracing output, for local
//!   development
//! - **MemoryBroker**: collects batches in memory, with optional failure
//!   injection, for tests
//!
//! The broker connection is owned exclusively by the relay worker, so
//! implementations only need `Send + Sync`, not their own locking protocol
//! against other pipeline components.

pub mod log;
pub mod memory;

// Re-export commonly used types
pub use self::log::LogBroker;
pub use self::memory::MemoryBroker;

use crate::utils::errors::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// External capability that transmits serialized records to a message broker
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Attempt delivery of one batch of serialized records. The relay makes
    /// at most one attempt per batch; an `Err` means the whole batch is
    /// dropped.
    async fn send_batch(&self, payloads: &[Bytes]) -> Result<()>;

    /// Wait up to `timeout` for internally buffered records to drain and
    /// return how many remain. Brokers without an internal buffer keep the
    /// default.
    async fn flush(&self, timeout: Duration) -> usize {
        let _ = timeout;
        0
    }
}
