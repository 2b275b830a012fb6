//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use super::MemTableEntry;

/// In-memory table for recent writes
pub struct MemTable {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<Vec<u8>, MemTableEntry>,
    /// Approximate size: key bytes plus value bytes (tombstones count the key)
    size: usize,
}

fn footprint(key: &[u8], entry: &MemTableEntry) -> usize {
    match entry {
        MemTableEntry::Value(v) => key.len() + v.len(),
        MemTableEntry::Tombstone => key.len(),
    }
}

impl Inner {
    fn insert(&mut self, key: Vec<u8>, entry: MemTableEntry) -> usize {
        let added = footprint(&key, &entry);
        if let Some(previous) = self.data.get(&key) {
            self.size -= footprint(&key, previous);
        }
        self.data.insert(key, entry);
        self.size += added;
        self.size
    }
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Get the entry for a key (value or tombstone)
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.inner.read().data.get(key).cloned()
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        self.inner.write().insert(key, MemTableEntry::Value(value))
    }

    /// Record a tombstone for a key, returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        self.inner.write().insert(key, MemTableEntry::Tombstone)
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Check if size has reached the limit
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> Vec<(Vec<u8>, MemTableEntry)> {
        self.inner
            .read()
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Snapshot of entries whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, MemTableEntry)> {
        let inner = self.inner.read();
        inner
            .data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keys (tombstones included) starting with `prefix`, in key order
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let inner = self.inner.read();
        inner
            .data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.data.clear();
        inner.size = 0;
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
