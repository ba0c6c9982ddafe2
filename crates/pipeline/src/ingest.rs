use std::sync::Arc;
use std::time::{Duration, Instant};

use stats_core::{AnalyticsConfig, EventRecord, Result};
use telemetry::metrics;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::buffer::EventBuffer;
use crate::sampler::Sampler;
use crate::sink::EventSink;
use crate::volume::DailyVolume;

/// What happened to a recorded event.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Staged in the buffer, will flush later.
    Buffered,
    /// The event filled the batch and this many rows were written.
    Flushed(usize),
    /// Discarded by volume sampling.
    Sampled,
    /// Discarded because tracking is switched off.
    Disabled,
}

/// Front door of the write path. Applies sampling, stages events in
/// the buffer, and flushes full or aged batches into the sink.
pub struct Ingestor<S: EventSink> {
    sink: Arc<S>,
    buffer: EventBuffer,
    sampler: Sampler,
    volume: DailyVolume,
    max_age: Duration,
    enabled: bool,
}

impl<S: EventSink> Ingestor<S> {
    pub fn new(sink: Arc<S>, config: &AnalyticsConfig, initial_volume: u64) -> Self {
        Self {
            sink,
            buffer: EventBuffer::new(config.batch_size),
            sampler: Sampler::new(config),
            volume: DailyVolume::today(initial_volume),
            max_age: Duration::from_secs(config.realtime_timeout_secs),
            enabled: config.tracking_enabled,
        }
    }

    /// Records one event. On a failed flush the batch is already back
    /// in the buffer when the error returns; nothing is lost unless
    /// the buffer overflows its cap.
    pub async fn record(&self, event: EventRecord) -> Result<RecordOutcome> {
        metrics().events_received.inc();
        if !self.enabled {
            return Ok(RecordOutcome::Disabled);
        }
        let started = Instant::now();

        let daily_volume = if event.event_type == "pageview" {
            self.volume.record()
        } else {
            self.volume.current()
        };
        if self
            .sampler
            .should_drop(daily_volume, &mut rand::thread_rng())
        {
            metrics().events_sampled_out.inc();
            debug!(event_type = %event.event_type, daily_volume, "event sampled out");
            return Ok(RecordOutcome::Sampled);
        }

        metrics().events_buffered.inc();
        let outcome = match self.buffer.append(event) {
            Some(batch) => {
                let written = self.flush_batch(batch).await?;
                RecordOutcome::Flushed(written)
            }
            None => RecordOutcome::Buffered,
        };
        metrics()
            .ingest_latency_ms
            .observe(started.elapsed().as_millis() as u64);
        Ok(outcome)
    }

    /// Flushes everything pending, regardless of age. Used at shutdown
    /// and by tests.
    pub async fn flush(&self) -> Result<usize> {
        let pending = self.buffer.take_all();
        if pending.is_empty() {
            return Ok(0);
        }
        self.flush_batch(pending).await
    }

    /// Flushes pending events older than the realtime timeout.
    pub async fn flush_aged(&self) -> Result<usize> {
        match self.buffer.take_aged(self.max_age) {
            Some(pending) => self.flush_batch(pending).await,
            None => Ok(0),
        }
    }

    async fn flush_batch(&self, batch: Vec<EventRecord>) -> Result<usize> {
        let count = batch.len();
        match self.sink.insert_batch(&batch).await {
            Ok(written) => {
                metrics().batches_flushed.inc();
                debug!(written, "flushed event batch");
                Ok(written)
            }
            Err(e) => {
                metrics().flush_errors.inc();
                if e.is_transient() {
                    warn!(count, error = %e, "flush failed, batch re-buffered for retry");
                } else {
                    error!(count, error = %e, "flush failed with non-transient error, batch re-buffered");
                }
                self.buffer.restore(batch);
                Err(e)
            }
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Spawns the background tick that flushes aged partial batches.
    pub fn start_flush_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let ingestor = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "flush task started");
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                if let Err(e) = ingestor.flush_aged().await {
                    error!(error = %e, "periodic flush failed");
                }
            }
        })
    }
}
