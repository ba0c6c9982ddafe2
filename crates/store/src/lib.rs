//! SQLite-backed persistence for events and pre-aggregated stats.
//!
//! The store owns two tables: `events` (raw, batch-inserted) and `stats`
//! (hourly/daily rollups maintained by upsert). All timestamps in `events`
//! are epoch milliseconds UTC; `stats` keys on a calendar date plus an
//! hour slot, where slot `-1` means "whole day".

pub mod aggregate;
pub mod client;
pub mod config;
pub mod insert;
pub mod query;
pub mod retention;
pub mod schema;

pub use aggregate::{default_daily_metrics, AggregateOutcome, MetricSpec};
pub use client::SqliteStore;
pub use config::StoreConfig;
pub use query::QuickStats;

use stats_core::Error;

pub(crate) fn store_err(e: sqlx::Error) -> Error {
    Error::store(e.to_string())
}
