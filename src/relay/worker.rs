// src/relay/worker.rs
//! Batching relay worker
//!
//! Single background task that drains the ingestion queue into an in-memory
//! batch and hands the batch to the broker client when either threshold is
//! reached:
//!
//! - **count**: the batch holds `batch_max_messages` records
//! - **time**: a non-empty batch is older than `flush_interval_ms`
//!
//! The idle wait is bounded by the flush interval, so a stale batch flushes
//! even with no new traffic. Delivery is awaited synchronously from the
//! loop, which backpressures against broker slowness without ever blocking
//! producers. A failed delivery drops the batch: at most one attempt per
//! batch, the worker never dies on a broker error.

use crate::broker::BrokerClient;
use crate::capture::record::TrafficRecord;
use crate::relay::queue::RecordQueue;
use crate::utils::config::RelayConfig;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Relay delivery counters, shared with the owning pipeline
#[derive(Debug, Clone, Default)]
pub(crate) struct WorkerStats {
    pub batches_flushed: u64,
    pub records_delivered: u64,
    pub delivery_failures: u64,
    pub records_lost: u64,
}

pub(crate) struct RelayWorker {
    queue: Arc<RecordQueue>,
    broker: Arc<dyn BrokerClient>,
    config: RelayConfig,
    stop: CancellationToken,
    stats: Arc<Mutex<WorkerStats>>,
}

impl RelayWorker {
    pub(crate) fn new(
        queue: Arc<RecordQueue>,
        broker: Arc<dyn BrokerClient>,
        config: RelayConfig,
        stop: CancellationToken,
        stats: Arc<Mutex<WorkerStats>>,
    ) -> Self {
        Self {
            queue,
            broker,
            config,
            stop,
            stats,
        }
    }

    /// Run until the stop token fires, then drain and stop.
    pub(crate) async fn run(self) {
        let flush_interval = Duration::from_millis(self.config.flush_interval_ms);
        let mut batch: Vec<TrafficRecord> = Vec::with_capacity(self.config.batch_max_messages);
        let mut last_flush = Instant::now();

        info!(
            batch_max = self.config.batch_max_messages,
            flush_interval_ms = self.config.flush_interval_ms,
            "Relay worker started"
        );

        loop {
            // Wait for new data, the flush deadline, or shutdown. The sleep
            // is the time left until the current batch goes stale.
            let deadline = flush_interval
                .checked_sub(last_flush.elapsed())
                .unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = self.stop.cancelled() => break,
                _ = self.queue.notified() => {}
                _ = tokio::time::sleep(deadline) => {}
            }

            self.drain(&mut batch, &mut last_flush, flush_interval).await;
        }

        // Terminal drain: every record enqueued before stop() goes out.
        self.drain(&mut batch, &mut last_flush, flush_interval).await;
        self.final_flush(&mut batch).await;

        info!("Relay worker stopped");
    }

    /// Move queued records into the batch and flush on either trigger.
    async fn drain(
        &self,
        batch: &mut Vec<TrafficRecord>,
        last_flush: &mut Instant,
        flush_interval: Duration,
    ) {
        loop {
            while batch.len() < self.config.batch_max_messages {
                match self.queue.try_pop() {
                    Some(record) => batch.push(record),
                    None => break,
                }
            }
            if batch.len() >= self.config.batch_max_messages {
                self.flush(batch).await;
                *last_flush = Instant::now();
                // The queue may still hold records beyond one batch
                continue;
            }
            break;
        }

        // Time trigger. A count flush above resets the clock, so a batch
        // that satisfied both thresholds flushes exactly once. Running out
        // of queued records alone never flushes.
        if !batch.is_empty() && last_flush.elapsed() >= flush_interval {
            self.flush(batch).await;
            *last_flush = Instant::now();
        }
    }

    /// Hand the batch to the broker. One attempt per batch: on failure the
    /// records are dropped with a log line and the worker keeps going.
    async fn flush(&self, batch: &mut Vec<TrafficRecord>) {
        if batch.is_empty() {
            return;
        }

        let payloads = self.serialize(batch);
        batch.clear();
        if payloads.is_empty() {
            return;
        }

        let count = payloads.len();
        debug!(records = count, "Flushing batch to broker");

        match self.broker.send_batch(&payloads).await {
            Ok(()) => {
                let mut stats = self.stats.lock();
                stats.batches_flushed += 1;
                stats.records_delivered += count as u64;
            }
            Err(e) => {
                error!(records = count, error = %e, "Batch delivery failed, dropping batch");
                let mut stats = self.stats.lock();
                stats.delivery_failures += 1;
                stats.records_lost += count as u64;
            }
        }
    }

    /// Serialize records to their wire form, skipping (and counting) any
    /// record that fails to serialize rather than aborting the batch.
    fn serialize(&self, batch: &[TrafficRecord]) -> Vec<Bytes> {
        let mut payloads = Vec::with_capacity(batch.len());
        for record in batch {
            match serde_json::to_vec(record) {
                Ok(bytes) => payloads.push(Bytes::from(bytes)),
                Err(e) => {
                    error!(error = %e, "Failed to serialize record, skipping");
                    self.stats.lock().records_lost += 1;
                }
            }
        }
        payloads
    }

    /// Exactly one shutdown flush attempt, bounded so a broken broker
    /// cannot hang `stop()`.
    async fn final_flush(&self, batch: &mut Vec<TrafficRecord>) {
        let flush_timeout = Duration::from_millis(self.config.shutdown_flush_timeout_ms);

        if !batch.is_empty() {
            let remainder = batch.len();
            if tokio::time::timeout(flush_timeout, self.flush(batch))
                .await
                .is_err()
            {
                warn!(
                    records = remainder,
                    "Shutdown flush timed out, dropping remaining batch"
                );
                self.stats.lock().records_lost += remainder as u64;
                batch.clear();
            }
        }

        // Let brokers with an internal buffer settle before the pipeline
        // reports itself stopped.
        let remaining = self.broker.flush(flush_timeout).await;
        if remaining > 0 {
            warn!(remaining, "Broker still buffers records after shutdown flush");
        }
    }
}
