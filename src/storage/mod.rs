//! Storage Module
//!
//! Persistent storage layer built from immutable sorted segment files.
//!
//! ## Responsibilities
//! - Persist flushed memtables to disk in sorted format
//! - Point lookups and prefix scans across segments (newest wins)
//! - Full compaction into a single segment

mod segment;
mod manager;

pub use segment::{Segment, SegmentBuilder, SegmentIterator, SegmentReader};
pub use manager::StorageManager;
