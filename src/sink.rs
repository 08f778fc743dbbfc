//! Bounded metric hand-off between a collector and the harness.
//!
//! [`channel`] returns a producer ([`MetricSink`]) and a consumer ([`MetricReceiver`])
//! sharing a bounded tokio MPSC queue. The producer side is synchronous and must be
//! used from a blocking context (collectors run on the blocking pool); the consumer
//! side is drained asynchronously while the producer is still running, so the
//! capacity only bounds memory and never limits how many metrics a collector emits.
//!
//! The queue closes once the [`MetricSink`] is dropped.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::metric::Metric;

/// Default sink capacity.
pub const DEFAULT_SINK_CAPACITY: usize = 100;

/// Errors raised when writing into a sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The consumer went away before the metric could be delivered.
    #[error("metric sink closed")]
    Closed,
}

/// Create a bounded sink/receiver pair.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (MetricSink, MetricReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MetricSink { tx }, MetricReceiver { rx })
}

/// Producer half handed to [`Collector::convert`](crate::collector::Collector::convert).
#[derive(Debug)]
pub struct MetricSink {
    tx: mpsc::Sender<Metric>,
}

impl MetricSink {
    /// Push one metric, blocking while the queue is full.
    ///
    /// Must not be called from within an async task.
    pub fn push(&self, metric: Metric) -> Result<(), SinkError> {
        self.tx.blocking_send(metric).map_err(|_| SinkError::Closed)
    }

    /// Remaining free slots.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer half owned by the test runner.
#[derive(Debug)]
pub struct MetricReceiver {
    rx: mpsc::Receiver<Metric>,
}

impl MetricReceiver {
    /// Receive the next metric, or `None` once the sink is dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<Metric> {
        self.rx.recv().await
    }

    /// Receive a metric without waiting, or `None` if none is queued.
    pub fn try_recv(&mut self) -> Option<Metric> {
        self.rx.try_recv().ok()
    }

    /// Drain every remaining metric, passing each to `inspect`, and return how many were read.
    pub async fn drain_with<F>(&mut self, mut inspect: F) -> usize
    where
        F: FnMut(Metric),
    {
        let mut drained = 0;
        while let Some(metric) = self.rx.recv().await {
            drained += 1;
            inspect(metric);
        }
        drained
    }
}
