//! Storage Manager
//!
//! Manages the set of segments and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing segments on startup
//! - Search segments newest → oldest for reads
//! - Create new segments from MemTable flushes
//! - Merge all segments into one on compaction

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{ConfkvError, Result};
use crate::memtable::{MemTable, MemTableEntry};

use super::{Segment, SegmentBuilder, SegmentReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `segments`: RwLock; lookups share it, flush/compaction take it exclusively
/// - `next_segment_id`: atomic counter
pub struct StorageManager {
    /// Directory where segments are stored
    data_dir: PathBuf,

    /// Open segment readers, ordered newest → oldest
    segments: RwLock<Vec<SegmentReader>>,

    /// Next ID for creating new segments
    next_segment_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// Existing segments are opened (indexes loaded into RAM) and ordered
    /// newest first.
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_segment_id(&file_path) {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let segments = ids
            .iter()
            .map(|id| SegmentReader::open(&Self::segment_path_in(path, *id)))
            .collect::<Result<Vec<_>>>()?;

        let next_id = ids.first().map(|&id| id + 1).unwrap_or(1);

        tracing::debug!(
            dir = %path.display(),
            segments = segments.len(),
            next_id,
            "Storage opened"
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            segments: RwLock::new(segments),
            next_segment_id: AtomicU64::new(next_id),
        })
    }

    /// Get a value by key (searches all segments newest → oldest)
    ///
    /// Returns `Ok(None)` when the key is absent or its newest entry is a
    /// tombstone.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let segments = self.segments.read();

        for reader in segments.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            match reader.get(key) {
                Ok(found) => return Ok(found),
                Err(ConfkvError::KeyNotFound) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Entries under `prefix` across all segments, newest entry per key
    ///
    /// Tombstones are kept (`None`) so callers can overlay newer layers.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, Option<Vec<u8>>>> {
        let segments = self.segments.read();
        let mut merged = BTreeMap::new();

        for reader in segments.iter() {
            for (key, value) in reader.scan_prefix(prefix)? {
                merged.entry(key).or_insert(value);
            }
        }

        Ok(merged)
    }

    /// Distinct keys under `prefix` across all segments, tombstoned ones included
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> BTreeSet<Vec<u8>> {
        self.segments
            .read()
            .iter()
            .flat_map(|reader| reader.keys_with_prefix(prefix).map(<[u8]>::to_vec).collect::<Vec<_>>())
            .collect()
    }

    /// Flush a MemTable to a new segment
    pub fn flush(&self, memtable: &MemTable) -> Result<Segment> {
        if memtable.is_empty() {
            return Err(ConfkvError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let id = self.next_segment_id.fetch_add(1, Ordering::SeqCst);
        let path = self.segment_path(id);

        let mut builder = SegmentBuilder::new(&path)?;
        for (key, entry) in memtable.iter() {
            match entry {
                MemTableEntry::Value(v) => builder.add(&key, &v)?,
                MemTableEntry::Tombstone => builder.add_tombstone(&key)?,
            }
        }
        let metadata = builder.finish()?;

        let reader = SegmentReader::open(&path)?;
        self.segments.write().insert(0, reader);

        tracing::debug!(
            segment = %path.display(),
            entries = metadata.entry_count,
            bytes = metadata.file_size,
            "Flushed memtable"
        );

        Ok(metadata)
    }

    /// Merge every segment into a single one, dropping tombstones
    ///
    /// Returns the new segment, or `None` when nothing live remained.
    pub fn compact(&self) -> Result<Option<Segment>> {
        let mut segments = self.segments.write();
        if segments.len() <= 1 {
            return Ok(None);
        }

        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = BTreeMap::new();
        for reader in segments.iter().rev() {
            for (key, value) in reader.entries()? {
                merged.insert(key, value);
            }
        }

        let mut metadata = None;
        let mut replacement = Vec::new();
        if merged.values().any(Option::is_some) {
            let id = self.next_segment_id.fetch_add(1, Ordering::SeqCst);
            let path = self.segment_path(id);
            let mut builder = SegmentBuilder::new(&path)?;
            for (key, value) in merged.iter() {
                if let Some(v) = value {
                    builder.add(key, v)?;
                }
            }
            metadata = Some(builder.finish()?);
            replacement.push(SegmentReader::open(&path)?);
        }

        let old = std::mem::replace(&mut *segments, replacement);
        for reader in old {
            fs::remove_file(reader.path())?;
        }

        tracing::debug!(dir = %self.data_dir.display(), "Compacted segments");
        Ok(metadata)
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next segment ID (for testing/debugging)
    pub fn next_segment_id(&self) -> u64 {
        self.next_segment_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn segment_path(&self, id: u64) -> PathBuf {
        Self::segment_path_in(&self.data_dir, id)
    }

    fn segment_path_in(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("segment_{:06}.seg", id))
    }

    /// "segment_000042.seg" → Some(42)
    fn parse_segment_id(path: &Path) -> Option<u64> {
        if path.extension()? != "seg" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        name.strip_prefix("segment_")?.parse().ok()
    }
}
