//! The write path: sampling, in-memory buffering, and batched flush
//! into the store. Events are held in an [`EventBuffer`] until the
//! batch fills or ages out, then handed to an [`EventSink`] in one
//! all-or-nothing insert.

pub mod buffer;
pub mod ingest;
pub mod sampler;
pub mod sink;
pub mod volume;

pub use buffer::EventBuffer;
pub use ingest::{Ingestor, RecordOutcome};
pub use sampler::Sampler;
pub use sink::EventSink;
pub use volume::DailyVolume;
