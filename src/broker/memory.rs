// src/broker/memory.rs
//! In-memory broker double
//!
//! Collects every delivered batch so tests can assert on batch boundaries,
//! record order, and failure behavior. Delivery failures can be toggled at
//! runtime to exercise the relay's drop-on-failure policy.

use crate::broker::BrokerClient;
use crate::utils::errors::{RelayError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Broker that stores batches in memory
#[derive(Default)]
pub struct MemoryBroker {
    batches: Mutex<Vec<Vec<Bytes>>>,
    fail: AtomicBool,
    attempts: AtomicU64,
}

impl MemoryBroker {
    /// Create an empty broker that accepts every batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure injection: while set, every delivery attempt fails
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All delivered batches, in delivery order
    pub fn batches(&self) -> Vec<Vec<Bytes>> {
        self.batches.lock().clone()
    }

    /// All delivered records flattened, in delivery order
    pub fn records(&self) -> Vec<Bytes> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Number of delivered batches
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// Number of delivered records
    pub fn record_count(&self) -> usize {
        self.batches.lock().iter().map(Vec::len).sum()
    }

    /// Number of delivery attempts, successful or not
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerClient for MemoryBroker {
    async fn send_batch(&self, payloads: &[Bytes]) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RelayError::DeliveryFailed(
                "memory broker failure injected".to_string(),
            ));
        }
        self.batches.lock().push(payloads.to_vec());
        Ok(())
    }
}
