// src/relay/queue.rs
//! Record ingestion queue
//!
//! Lock-free FIFO handoff between any number of capture threads and the
//! single relay worker. The queue is unbounded on purpose: producers are
//! request-handling threads that must not stall, so the pipeline accepts
//! every record instead of applying backpressure. The broker-side batching
//! in the worker is what bounds memory in steady state.

use crate::capture::record::TrafficRecord;
use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// Thread-safe FIFO between capture producers and the relay worker
pub struct RecordQueue {
    /// Underlying unbounded queue
    queue: SegQueue<TrafficRecord>,

    /// Wakes the relay worker on new data or shutdown
    wake: Notify,

    /// Push counter
    push_count: AtomicU64,

    /// Pop counter
    pop_count: AtomicU64,
}

impl RecordQueue {
    /// Create a new record queue
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            wake: Notify::new(),
            push_count: AtomicU64::new(0),
            pop_count: AtomicU64::new(0),
        }
    }

    /// Push a record and wake the relay worker. Always succeeds; the only
    /// cost to the caller is the queue's internal CAS loop.
    pub fn push(&self, record: TrafficRecord) {
        self.queue.push(record);
        self.push_count.fetch_add(1, Ordering::Relaxed);
        self.wake.notify_one();
    }

    /// Pop one record without blocking. Consumed only by the relay worker.
    pub fn try_pop(&self) -> Option<TrafficRecord> {
        let record = self.queue.pop();
        if record.is_some() {
            self.pop_count.fetch_add(1, Ordering::Relaxed);
        }
        record
    }

    /// Resolves on the next wake. A wake that arrives while nobody is
    /// waiting is stored as a permit, so no wakeup is lost between drains.
    pub async fn notified(&self) {
        self.wake.notified().await;
    }

    /// Wake the worker without pushing a record (used on shutdown)
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            push_count: self.push_count.load(Ordering::Relaxed),
            pop_count: self.pop_count.load(Ordering::Relaxed),
            current_size: self.queue.len(),
        }
    }
}

impl Default for RecordQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue statistics
#[derive(Debug, Clone)]
pub struct QueueStats {
    /// Total records pushed
    pub push_count: u64,

    /// Total records popped
    pub pop_count: u64,

    /// Current queue size
    pub current_size: usize,
}
