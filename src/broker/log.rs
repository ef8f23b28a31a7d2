// src/broker/log.rs
//! Logging broker for local development
//!
//! Delivers every record to the tracing output instead of a real broker.
//! Handy for watching the pipeline end to end without any infrastructure.

use crate::broker::BrokerClient;
use crate::utils::errors::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

/// Broker that logs records instead of transmitting them
pub struct LogBroker;

#[async_trait]
impl BrokerClient for LogBroker {
    async fn send_batch(&self, payloads: &[Bytes]) -> Result<()> {
        for payload in payloads {
            debug!(record = %String::from_utf8_lossy(payload), "Delivering record");
        }
        info!(records = payloads.len(), "Delivered batch");
        Ok(())
    }
}
