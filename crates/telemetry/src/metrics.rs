//! Internal metrics collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }
}

/// Collected metrics for the analytics pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion
    pub events_received: Counter,
    pub events_sampled_out: Counter,
    pub events_rejected: Counter,
    pub events_buffered: Counter,

    // Flush / store
    pub batches_flushed: Counter,
    pub flush_errors: Counter,
    pub events_inserted: Counter,
    pub events_dropped_overflow: Counter,

    // Aggregation
    pub stats_upserted: Counter,
    pub stats_upsert_errors: Counter,

    // Retention
    pub events_swept: Counter,
    pub stats_swept: Counter,

    // Latency histograms
    pub ingest_latency_ms: Histogram,
    pub flush_latency_ms: Histogram,
    pub aggregate_latency_ms: Histogram,

    // Gauges
    pub buffer_depth: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_received: self.events_received.get(),
            events_sampled_out: self.events_sampled_out.get(),
            events_rejected: self.events_rejected.get(),
            events_buffered: self.events_buffered.get(),
            batches_flushed: self.batches_flushed.get(),
            flush_errors: self.flush_errors.get(),
            events_inserted: self.events_inserted.get(),
            events_dropped_overflow: self.events_dropped_overflow.get(),
            stats_upserted: self.stats_upserted.get(),
            stats_upsert_errors: self.stats_upsert_errors.get(),
            events_swept: self.events_swept.get(),
            stats_swept: self.stats_swept.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            flush_latency_mean_ms: self.flush_latency_ms.mean(),
            aggregate_latency_mean_ms: self.aggregate_latency_ms.mean(),
            buffer_depth: self.buffer_depth.get(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_received: u64,
    pub events_sampled_out: u64,
    pub events_rejected: u64,
    pub events_buffered: u64,
    pub batches_flushed: u64,
    pub flush_errors: u64,
    pub events_inserted: u64,
    pub events_dropped_overflow: u64,
    pub stats_upserted: u64,
    pub stats_upsert_errors: u64,
    pub events_swept: u64,
    pub stats_swept: u64,
    pub ingest_latency_mean_ms: f64,
    pub flush_latency_mean_ms: f64,
    pub aggregate_latency_mean_ms: f64,
    pub buffer_depth: u64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
