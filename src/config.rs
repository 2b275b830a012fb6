//! Configuration for confkv
//!
//! One `Config` drives the storage engine, the store selection and the HTTP
//! server. Built with `Config::builder()`; the server binary fills it from
//! command-line flags and `CONFKV_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ConfkvError, Result};

const WAL_FILENAME: &str = "wal.log";
const SEGMENT_DIR: &str = "segments";

/// Main configuration for a confkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── segments/        (sorted segment files)
    pub data_dir: PathBuf,

    /// Which store backs the config service
    pub backend: StorageBackend,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Segment Configuration
    // -------------------------------------------------------------------------
    /// Segment count above which a flush merges every segment into one
    pub max_segments: usize,

    // -------------------------------------------------------------------------
    // HTTP Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Largest accepted request body (in bytes)
    pub max_body_bytes: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Store implementation selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Durable WAL + segment engine under `data_dir`
    Engine,

    /// Process-local map, lost on exit
    Memory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./confkv_data"),
            backend: StorageBackend::Engine,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            max_segments: 8,
            listen_addr: "127.0.0.1:3000".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Location of the write-ahead log
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(WAL_FILENAME)
    }

    /// Directory holding segment files
    pub fn segment_dir(&self) -> PathBuf {
        self.data_dir.join(SEGMENT_DIR)
    }

    /// Parsed `listen_addr`
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            ConfkvError::Config(format!("Invalid listen address {:?}: {}", self.listen_addr, e))
        })
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.memtable_size_limit == 0 {
            return Err(ConfkvError::Config("memtable_size_limit must be positive".to_string()));
        }
        if self.max_segments == 0 {
            return Err(ConfkvError::Config("max_segments must be at least one".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfkvError::Config("max_body_bytes must be positive".to_string()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(ConfkvError::Config("WAL sync interval must be at least one entry".to_string()));
        }
        self.socket_addr()?;
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Select the storage backend
    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set how many segments may accumulate before compaction
    pub fn max_segments(mut self, count: usize) -> Self {
        self.config.max_segments = count;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the request body limit (in bytes)
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
