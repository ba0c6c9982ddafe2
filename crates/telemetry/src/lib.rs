//! Internal telemetry for bandstats.
//!
//! In-process counters and histograms only; operators read them through
//! logs and the health endpoints rather than an external metrics system.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
