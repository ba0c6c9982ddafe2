//! Runtime configuration for the analytics pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable analytics behavior.
///
/// Validated once at startup via [`AnalyticsConfig::validate`]; a bad value
/// fails fast rather than per-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Master switch; when off, ingestion reports events as dropped.
    #[serde(default = "default_tracking_enabled")]
    pub tracking_enabled: bool,

    /// Daily pageview count above which sampling kicks in.
    #[serde(default = "default_sampling_threshold")]
    pub sampling_threshold: u64,

    /// Probability of keeping an event once over the threshold, in (0, 1].
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,

    /// Buffered events per flush.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum seconds a buffered event waits before an aged flush.
    #[serde(default = "default_realtime_timeout_secs")]
    pub realtime_timeout_secs: u64,

    /// Retention horizon for raw events and aggregates.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_tracking_enabled() -> bool {
    true
}

fn default_sampling_threshold() -> u64 {
    10_000
}

fn default_sampling_rate() -> f64 {
    0.1
}

fn default_batch_size() -> usize {
    100
}

fn default_realtime_timeout_secs() -> u64 {
    5
}

fn default_retention_days() -> u32 {
    365
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            tracking_enabled: default_tracking_enabled(),
            sampling_threshold: default_sampling_threshold(),
            sampling_rate: default_sampling_rate(),
            batch_size: default_batch_size(),
            realtime_timeout_secs: default_realtime_timeout_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl AnalyticsConfig {
    /// Rejects configurations that would misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        if !(self.sampling_rate > 0.0 && self.sampling_rate <= 1.0) {
            return Err(Error::config(format!(
                "sampling_rate must be in (0, 1], got {}",
                self.sampling_rate
            )));
        }
        if self.realtime_timeout_secs == 0 {
            return Err(Error::config("realtime_timeout_secs must be at least 1"));
        }
        if self.retention_days == 0 {
            return Err(Error::config("retention_days must be at least 1"));
        }
        Ok(())
    }
}
