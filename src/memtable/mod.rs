//! MemTable Module
//!
//! Sorted in-memory layer holding engine writes that have been logged but
//! not yet flushed to a segment. Deletes are kept as tombstones so they
//! shadow older segment entries until compaction.

mod table;

pub use table::MemTable;

/// Value slot for one key
#[derive(Debug, Clone, PartialEq)]
pub enum MemTableEntry {
    Value(Vec<u8>),

    /// Deleted; hides any older value in segments
    Tombstone,
}
