//! Segment Module
//!
//! Immutable on-disk sorted key-value files produced by memtable flushes.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "CFKV" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   (ValLen = u32::MAX means tombstone, no value bytes)   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Block (variable)                                  │
//! │   [KeyLen: u32][Offset: u64][Key]                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   IndexOffset: u64 (8) | DataCRC: u32 (4) | Padding (4) │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod iterator;
mod reader;

use std::path::PathBuf;

pub use builder::SegmentBuilder;
pub use iterator::SegmentIterator;
pub use reader::SegmentReader;

/// Magic bytes identifying a confkv segment file
pub(crate) const MAGIC: &[u8; 4] = b"CFKV";

/// Current segment format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: u64 = 14;

/// Footer size: IndexOffset (8) + DataCRC (4) + Padding (4) = 16 bytes
pub(crate) const FOOTER_SIZE: u64 = 16;

/// Sentinel value indicating a tombstone (deleted key)
pub(crate) const TOMBSTONE_MARKER: u32 = u32::MAX;

/// Metadata describing a finished segment file
#[derive(Debug, Clone)]
pub struct Segment {
    /// Path to the segment file
    pub path: PathBuf,
    /// Number of entries (tombstones included)
    pub entry_count: u64,
    /// Smallest key
    pub min_key: Vec<u8>,
    /// Largest key
    pub max_key: Vec<u8>,
    /// File size in bytes
    pub file_size: u64,
}

impl Segment {
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Range check: false if key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.entry_count > 0 && key >= self.min_key.as_slice() && key <= self.max_key.as_slice()
    }
}

/// Read a little-endian u32 at `pos`
pub(crate) fn read_u32(buf: &[u8], pos: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[pos..pos + 4]);
    u32::from_le_bytes(raw)
}

/// Read a little-endian u64 at `pos`
pub(crate) fn read_u64(buf: &[u8], pos: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[pos..pos + 8]);
    u64::from_le_bytes(raw)
}
