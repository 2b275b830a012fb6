//! Record Store Module
//!
//! Persistence boundary for config records. The service only talks to the
//! `ConfigStore` trait; uniqueness of (client, version) is enforced here.
//!
//! ## Implementations
//! - `EngineStore`: records encoded into the WAL + segment engine
//! - `MemoryStore`: a locked ordered map, for tests and throwaway servers

mod engine_store;
mod memory;

pub use engine_store::EngineStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::record::ConfigRecord;

/// Storage primitives the config service is built on
///
/// Every method is a single atomic step against the store.
pub trait ConfigStore: Send + Sync {
    /// Persist a new record
    ///
    /// Fails with `DuplicateKey` if (client, version) already exists.
    fn insert(&self, record: &ConfigRecord) -> Result<()>;

    /// The record stored under exactly (client, version)
    fn find_one(&self, client: &str, version: i64) -> Result<Option<ConfigRecord>>;

    /// The record with the highest version for `client`
    fn find_latest(&self, client: &str) -> Result<Option<ConfigRecord>>;

    /// Overwrite an existing record
    ///
    /// Returns `false` if the record no longer exists; nothing is written.
    fn save(&self, record: &ConfigRecord) -> Result<bool>;

    /// Delete (client, version) and return what was stored there
    fn find_one_and_delete(&self, client: &str, version: i64) -> Result<Option<ConfigRecord>>;

    /// Make pending writes durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Open the store selected by `config.backend`
pub fn open_store(config: &Config) -> Result<Arc<dyn ConfigStore>> {
    let store: Arc<dyn ConfigStore> = match config.backend {
        StorageBackend::Engine => Arc::new(EngineStore::open(config.clone())?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!(backend = ?config.backend, "Config store opened");
    Ok(store)
}
