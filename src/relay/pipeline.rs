// src/relay/pipeline.rs
//! Pipeline lifecycle
//!
//! [`TrafficPipeline`] owns the ingestion queue, the relay worker task, and
//! the broker client. It is an explicitly constructed, explicitly owned
//! object injected into the host HTTP layer; there is no process-wide
//! singleton, so tests and embedders can run independent pipelines side by
//! side. The HTTP layer usually holds a cheap [`CaptureHandle`] clone while
//! the application keeps the pipeline itself for `start`/`stop`.

use crate::broker::BrokerClient;
use crate::capture::exchange::{RequestData, ResponseData};
use crate::capture::record::RecordBuilder;
use crate::relay::queue::RecordQueue;
use crate::relay::worker::{RelayWorker, WorkerStats};
use crate::utils::config::SdkConfig;
use crate::utils::errors::{RelayError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Snapshot of pipeline counters
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Records accepted by `capture`
    pub records_enqueued: u64,

    /// Records successfully handed to the broker
    pub records_delivered: u64,

    /// Batches successfully handed to the broker
    pub batches_flushed: u64,

    /// Failed delivery attempts (one per dropped batch)
    pub delivery_failures: u64,

    /// Records dropped on delivery or serialization failure
    pub records_lost: u64,

    /// Records currently waiting in the ingestion queue
    pub queue_depth: usize,
}

/// Capture-to-relay pipeline
pub struct TrafficPipeline {
    config: SdkConfig,
    builder: Arc<RecordBuilder>,
    queue: Arc<RecordQueue>,
    broker: Arc<dyn BrokerClient>,
    stop: CancellationToken,
    stats: Arc<Mutex<WorkerStats>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl TrafficPipeline {
    /// Create a pipeline relaying to the given broker. The worker does not
    /// run until [`start`](Self::start) is called.
    pub fn new(config: SdkConfig, broker: Arc<dyn BrokerClient>) -> Self {
        let builder = Arc::new(RecordBuilder::new(config.account_id.clone()));
        Self {
            config,
            builder,
            queue: Arc::new(RecordQueue::new()),
            broker,
            stop: CancellationToken::new(),
            stats: Arc::new(Mutex::new(WorkerStats::default())),
            worker_handle: None,
        }
    }

    /// Spawn the relay worker. Starting an already running pipeline is an
    /// error rather than silently leaking a second worker task.
    pub fn start(&mut self) -> Result<()> {
        if self.worker_handle.is_some() {
            return Err(RelayError::AlreadyStarted);
        }

        info!(account_id = %self.config.account_id, "Starting traffic pipeline");

        self.stop = CancellationToken::new();
        let worker = RelayWorker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.broker),
            self.config.relay.clone(),
            self.stop.clone(),
            Arc::clone(&self.stats),
        );
        self.worker_handle = Some(tokio::spawn(worker.run()));

        Ok(())
    }

    /// Capture one completed HTTP exchange. Fire-and-forget: never fails,
    /// and costs the request path nothing beyond the queue handoff.
    pub fn capture(&self, request: RequestData, response: ResponseData) {
        let record = self.builder.build(request, response);
        self.queue.push(record);
    }

    /// Cheap cloneable capture front-end for the host HTTP layer
    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            builder: Arc::clone(&self.builder),
            queue: Arc::clone(&self.queue),
        }
    }

    /// Stop the worker and drain. Every record enqueued before this call is
    /// handed to the broker before it returns (broker failures excepted).
    /// Safe to call more than once; later calls are no-ops.
    pub async fn stop(&mut self) {
        let Some(handle) = self.worker_handle.take() else {
            return;
        };

        info!("Stopping traffic pipeline");
        self.stop.cancel();
        self.queue.wake();

        if let Err(e) = handle.await {
            error!(error = %e, "Relay worker task failed during shutdown");
        }
    }

    /// Whether the relay worker is currently spawned
    pub fn is_running(&self) -> bool {
        self.worker_handle.is_some()
    }

    /// Snapshot of pipeline counters
    pub fn stats(&self) -> RelayStats {
        let worker = self.stats.lock().clone();
        let queue = self.queue.stats();
        RelayStats {
            records_enqueued: queue.push_count,
            records_delivered: worker.records_delivered,
            batches_flushed: worker.batches_flushed,
            delivery_failures: worker.delivery_failures,
            records_lost: worker.records_lost,
            queue_depth: queue.current_size,
        }
    }
}

/// Cloneable capture front-end, detached from pipeline lifecycle
#[derive(Clone)]
pub struct CaptureHandle {
    builder: Arc<RecordBuilder>,
    queue: Arc<RecordQueue>,
}

impl CaptureHandle {
    /// Same contract as [`TrafficPipeline::capture`]
    pub fn capture(&self, request: RequestData, response: ResponseData) {
        let record = self.builder.build(request, response);
        self.queue.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;
    use crate::utils::config::RelayConfig;
    use std::time::{Duration, Instant};

    fn test_config(batch_max_messages: usize, flush_interval_ms: u64) -> SdkConfig {
        SdkConfig {
            account_id: "test-account".to_string(),
            relay: RelayConfig {
                batch_max_messages,
                flush_interval_ms,
                shutdown_flush_timeout_ms: 2000,
            },
        }
    }

    fn exchange(path: &str) -> (RequestData, ResponseData) {
        let request = RequestData {
            method: "GET".to_string(),
            path: path.to_string(),
            ..Default::default()
        };
        let response = ResponseData {
            status: 200,
            ..Default::default()
        };
        (request, response)
    }

    async fn wait_until(timeout_ms: u64, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    fn delivered_paths(broker: &MemoryBroker) -> Vec<String> {
        broker
            .records()
            .iter()
            .map(|payload| {
                let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
                value["request"]["path"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_flush_by_count() {
        let broker = Arc::new(MemoryBroker::new());
        // Interval long enough that only the count trigger can fire
        let mut pipeline = TrafficPipeline::new(test_config(5, 60_000), broker.clone());
        pipeline.start().unwrap();

        for i in 0..5 {
            let (req, res) = exchange(&format!("/r{}", i));
            pipeline.capture(req, res);
        }

        assert!(wait_until(2000, || broker.record_count() == 5).await);
        assert_eq!(broker.batch_count(), 1);
        assert_eq!(broker.batches()[0].len(), 5);

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_flush_by_time() {
        let broker = Arc::new(MemoryBroker::new());
        let mut pipeline = TrafficPipeline::new(test_config(100, 300), broker.clone());
        pipeline.start().unwrap();

        let (req, res) = exchange("/lonely");
        pipeline.capture(req, res);

        // Below the count threshold, nothing flushes right away
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(broker.record_count(), 0);

        // ...but the stale batch flushes once the interval passes
        assert!(wait_until(2000, || broker.record_count() == 1).await);
        assert_eq!(broker.batch_count(), 1);

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_fifo_across_batches() {
        let broker = Arc::new(MemoryBroker::new());
        let mut pipeline = TrafficPipeline::new(test_config(3, 60_000), broker.clone());
        pipeline.start().unwrap();

        for i in 0..10 {
            let (req, res) = exchange(&format!("/r{}", i));
            pipeline.capture(req, res);
        }
        pipeline.stop().await;

        let paths = delivered_paths(&broker);
        let expected: Vec<String> = (0..10).map(|i| format!("/r{}", i)).collect();
        assert_eq!(paths, expected);
        // 10 records over batches of at most 3
        assert!(broker.batch_count() >= 4);
    }

    #[tokio::test]
    async fn test_drain_on_shutdown() {
        let broker = Arc::new(MemoryBroker::new());
        // Thresholds no regular flush can reach before stop()
        let mut pipeline = TrafficPipeline::new(test_config(1000, 60_000), broker.clone());
        pipeline.start().unwrap();

        for i in 0..100 {
            let (req, res) = exchange(&format!("/r{}", i));
            pipeline.capture(req, res);
        }
        pipeline.stop().await;

        // Everything enqueued before stop() is delivered before it returns
        assert_eq!(broker.record_count(), 100);
        let stats = pipeline.stats();
        assert_eq!(stats.records_enqueued, 100);
        assert_eq!(stats.records_delivered, 100);
        assert_eq!(stats.queue_depth, 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let broker = Arc::new(MemoryBroker::new());
        let mut pipeline = TrafficPipeline::new(test_config(10, 60_000), broker.clone());
        pipeline.start().unwrap();

        let (req, res) = exchange("/once");
        pipeline.capture(req, res);

        pipeline.stop().await;
        pipeline.stop().await;

        assert_eq!(broker.record_count(), 1);
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_double_start_is_an_error() {
        let broker = Arc::new(MemoryBroker::new());
        let mut pipeline = TrafficPipeline::new(test_config(10, 1000), broker);
        pipeline.start().unwrap();

        assert!(matches!(pipeline.start(), Err(RelayError::AlreadyStarted)));

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let broker = Arc::new(MemoryBroker::new());
        let mut pipeline = TrafficPipeline::new(test_config(1, 60_000), broker.clone());

        pipeline.start().unwrap();
        let (req, res) = exchange("/first");
        pipeline.capture(req, res);
        pipeline.stop().await;

        pipeline.start().unwrap();
        let (req, res) = exchange("/second");
        pipeline.capture(req, res);
        pipeline.stop().await;

        assert_eq!(delivered_paths(&broker), vec!["/first", "/second"]);
    }

    #[tokio::test]
    async fn test_worker_survives_delivery_failure() {
        let broker = Arc::new(MemoryBroker::new());
        broker.set_fail(true);

        let mut pipeline = TrafficPipeline::new(test_config(2, 60_000), broker.clone());
        pipeline.start().unwrap();

        let (req, res) = exchange("/lost-a");
        pipeline.capture(req, res);
        let (req, res) = exchange("/lost-b");
        pipeline.capture(req, res);

        assert!(wait_until(2000, || pipeline.stats().delivery_failures == 1).await);
        assert_eq!(broker.record_count(), 0);

        // The failed batch is gone for good; the next one goes through
        broker.set_fail(false);
        let (req, res) = exchange("/kept-a");
        pipeline.capture(req, res);
        let (req, res) = exchange("/kept-b");
        pipeline.capture(req, res);

        assert!(wait_until(2000, || broker.record_count() == 2).await);
        assert_eq!(delivered_paths(&broker), vec!["/kept-a", "/kept-b"]);

        let stats = pipeline.stats();
        assert_eq!(stats.records_lost, 2);
        assert_eq!(stats.records_delivered, 2);

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_capture_handle_feeds_pipeline() {
        let broker = Arc::new(MemoryBroker::new());
        let mut pipeline = TrafficPipeline::new(test_config(1000, 60_000), broker.clone());
        pipeline.start().unwrap();

        let handle = pipeline.handle();
        let captured = tokio::task::spawn_blocking(move || {
            // Capture from a plain thread, the way an HTTP worker would
            let (req, res) = exchange("/from-thread");
            handle.capture(req, res);
        });
        captured.await.unwrap();

        pipeline.stop().await;
        assert_eq!(delivered_paths(&broker), vec!["/from-thread"]);
    }
}
