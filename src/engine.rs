//! Engine Module
//!
//! The storage engine that coordinates WAL, MemTable and segments.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when MemTable is full
//! - Compact segments once too many accumulate
//! - Manage crash recovery on startup
//! - Provide the atomic conditional writes the record store relies on

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{ConfkvError, Result};
use crate::memtable::{MemTable, MemTableEntry};
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/conditional writes/flush): serialized by
///   `write_lock`. Conditional writes read and write under the same guard,
///   which makes them atomic with respect to every other write.
/// - **Reads** (get/scan_prefix/last_with_prefix): no write lock; MemTable and
///   StorageManager each use internal RwLocks. A read holds `flush_gate`
///   shared so a concurrent flush cannot move entries out of the MemTable
///   between the two lookups.
pub struct Engine {
    config: Config,

    /// Directory holding segment files
    storage_dir: PathBuf,

    /// Write-ahead log for durability
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes
    memtable: MemTable,

    /// Persistent segments
    storage: StorageManager,

    /// Serializes write operations
    write_lock: Mutex<()>,

    /// Held exclusively while MemTable contents move into a segment
    flush_gate: RwLock<()>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create data and segment directories
    /// 2. Load existing segments
    /// 3. Replay the WAL (if any) and flush it into a segment
    /// 4. Start a fresh WAL
    /// 5. Compact if restarts left more than `max_segments` segments
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.segment_dir();
        let wal_path = config.wal_path();

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    last_lsn = recovery.last_lsn,
                    "WAL recovery finished"
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Put { key, value } => {
                        memtable.put(key, value);
                    }
                    Operation::Delete { key } => {
                        memtable.delete(key);
                    }
                }
            }

            // Recovered writes must be durable in a segment before the WAL
            // is reopened (which truncates it).
            if !memtable.is_empty() {
                tracing::debug!(
                    entries = memtable.entry_count(),
                    "Flushing recovered entries"
                );
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        tracing::debug!(data_dir = %config.data_dir.display(), "Engine opened");

        let engine = Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
            flush_gate: RwLock::new(()),
        };
        engine.compact_if_needed()?;
        Ok(engine)
    }

    /// Open with default config rooted at `path`
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Segments (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let _gate = self.flush_gate.read();
        self.lookup(key)
    }

    /// The live pair with the greatest key under `prefix` that `accept` admits
    ///
    /// Candidates are walked from the highest key down using keys alone;
    /// only the admitted ones have their value read.
    pub fn last_with_prefix<F>(&self, prefix: &[u8], accept: F) -> Result<Option<(Vec<u8>, Vec<u8>)>>
    where
        F: Fn(&[u8]) -> bool,
    {
        let _gate = self.flush_gate.read();
        let mut keys = self.storage.keys_with_prefix(prefix);
        keys.extend(self.memtable.keys_with_prefix(prefix));

        for key in keys.into_iter().rev() {
            if !accept(key.as_slice()) {
                continue;
            }
            if let Some(value) = self.lookup(&key)? {
                return Ok(Some((key, value)));
            }
        }
        Ok(None)
    }

    /// All live pairs whose key starts with `prefix`, in ascending key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let _gate = self.flush_gate.read();
        let mut merged = self.storage.scan_prefix(prefix)?;

        for (key, entry) in self.memtable.scan_prefix(prefix) {
            let value = match entry {
                MemTableEntry::Value(v) => Some(v),
                MemTableEntry::Tombstone => None,
            };
            merged.insert(key, value);
        }

        Ok(merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _guard = self.lock_writes()?;
        self.put_locked(key, value)
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let _guard = self.lock_writes()?;
        self.delete_locked(key)
    }

    /// Write `value` only if `key` holds no live value
    ///
    /// Returns `false` (and writes nothing) when the key already exists.
    pub fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let _guard = self.lock_writes()?;
        if self.get(key)?.is_some() {
            return Ok(false);
        }
        self.put_locked(key, value)?;
        Ok(true)
    }

    /// Overwrite `key` only if it currently holds a live value
    ///
    /// Returns `false` (and writes nothing) when the key is absent.
    pub fn update_if_present(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let _guard = self.lock_writes()?;
        if self.get(key)?.is_none() {
            return Ok(false);
        }
        self.put_locked(key, value)?;
        Ok(true)
    }

    /// Delete `key` and return the value it held, if any
    pub fn remove(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock_writes()?;
        let previous = self.get(key)?;
        if previous.is_some() {
            self.delete_locked(key)?;
        }
        Ok(previous)
    }

    /// Flush memtable to disk regardless of its size
    pub fn flush(&self) -> Result<()> {
        let _guard = self.lock_writes()?;
        self.flush_locked()
    }

    /// Flush, then merge all segments into one
    pub fn compact(&self) -> Result<()> {
        let _guard = self.lock_writes()?;
        self.flush_locked()?;
        self.storage.compact()?;
        Ok(())
    }

    /// Close the engine, flushing pending data and syncing the WAL
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.lock_wal()?.sync()?;
        tracing::debug!(data_dir = %self.config.data_dir.display(), "Engine closed");
        Ok(())
    }

    // =========================================================================
    // Internals (write lock held)
    // =========================================================================

    /// MemTable first, then segments; caller holds `flush_gate`
    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.memtable.get(key) {
            return Ok(match entry {
                MemTableEntry::Value(value) => Some(value),
                MemTableEntry::Tombstone => None,
            });
        }

        self.storage.get(key)
    }

    fn put_locked(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.lock_wal()?.append(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;

        let new_size = self.memtable.put(key.to_vec(), value.to_vec());
        if new_size >= self.config.memtable_size_limit {
            self.flush_locked()?;
        }
        Ok(())
    }

    fn delete_locked(&self, key: &[u8]) -> Result<()> {
        self.lock_wal()?.append(Operation::Delete { key: key.to_vec() })?;

        let new_size = self.memtable.delete(key.to_vec());
        if new_size >= self.config.memtable_size_limit {
            self.flush_locked()?;
        }
        Ok(())
    }

    fn flush_locked(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        {
            let _gate = self.flush_gate.write();
            self.storage.flush(&self.memtable)?;
            self.memtable.clear();
        }
        // Entries are durable in a segment now
        self.lock_wal()?.truncate()?;
        self.compact_if_needed()
    }

    /// Merge all segments once their count exceeds `max_segments`
    ///
    /// Callers hold the write lock with an empty MemTable, so dropping
    /// tombstones during the merge cannot resurrect anything.
    fn compact_if_needed(&self) -> Result<()> {
        let count = self.storage.segment_count();
        if count > self.config.max_segments {
            tracing::debug!(
                segments = count,
                limit = self.config.max_segments,
                "Segment limit exceeded, compacting"
            );
            self.storage.compact()?;
        }
        Ok(())
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| ConfkvError::LockPoisoned(format!("Write lock poisoned: {}", e)))
    }

    fn lock_wal(&self) -> Result<MutexGuard<'_, WalWriter>> {
        self.wal
            .lock()
            .map_err(|e| ConfkvError::LockPoisoned(format!("WAL lock poisoned: {}", e)))
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Directory where segments are stored
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    pub fn segment_count(&self) -> usize {
        self.storage.segment_count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
