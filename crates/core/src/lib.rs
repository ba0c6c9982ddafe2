//! Core types, validation, and configuration for bandstats.

pub mod config;
pub mod error;
pub mod events;
pub mod limits;
pub mod privacy;

pub use config::*;
pub use error::{Error, Result};
pub use events::*;
pub use privacy::*;
