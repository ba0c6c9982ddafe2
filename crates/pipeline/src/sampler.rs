use rand::Rng;
use stats_core::AnalyticsConfig;

/// Volume-triggered sampling. Below the daily threshold every event is
/// kept; above it, events are kept with probability `rate`.
#[derive(Debug, Clone)]
pub struct Sampler {
    threshold: u64,
    rate: f64,
}

impl Sampler {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            threshold: config.sampling_threshold,
            rate: config.sampling_rate,
        }
    }

    /// True when the event should be discarded before buffering.
    pub fn should_drop<R: Rng>(&self, daily_volume: u64, rng: &mut R) -> bool {
        if daily_volume <= self.threshold {
            return false;
        }
        rng.gen::<f64>() >= self.rate
    }
}
