//! Engine-backed record store

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{ConfkvError, Result};
use crate::record::{ConfigRecord, RecordKey, UNIQUE_FIELDS};

use super::ConfigStore;

/// Stores each record under its encoded (client, version) key
pub struct EngineStore {
    engine: Engine,
}

impl EngineStore {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Open the engine described by `config`
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::new(Engine::open(config)?))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Release the store, flushing and syncing the engine
    pub fn close(self) -> Result<()> {
        self.engine.close()
    }
}

impl ConfigStore for EngineStore {
    fn insert(&self, record: &ConfigRecord) -> Result<()> {
        let inserted = self
            .engine
            .insert_if_absent(record.key().as_bytes(), &record.encode()?)?;
        if !inserted {
            return Err(ConfkvError::DuplicateKey {
                fields: UNIQUE_FIELDS.to_vec(),
            });
        }
        Ok(())
    }

    fn find_one(&self, client: &str, version: i64) -> Result<Option<ConfigRecord>> {
        self.engine
            .get(RecordKey::new(client, version).as_bytes())?
            .map(|bytes| ConfigRecord::decode(&bytes))
            .transpose()
    }

    fn find_latest(&self, client: &str) -> Result<Option<ConfigRecord>> {
        // A client name containing the separator byte can share a prefix
        // with another client, so confirm the decoded owner.
        let owned_by_client =
            |key: &[u8]| matches!(RecordKey::decode(key), Some((owner, _)) if owner == client);

        self.engine
            .last_with_prefix(&RecordKey::prefix(client), owned_by_client)?
            .map(|(_, value)| ConfigRecord::decode(&value))
            .transpose()
    }

    fn save(&self, record: &ConfigRecord) -> Result<bool> {
        self.engine
            .update_if_present(record.key().as_bytes(), &record.encode()?)
    }

    fn find_one_and_delete(&self, client: &str, version: i64) -> Result<Option<ConfigRecord>> {
        self.engine
            .remove(RecordKey::new(client, version).as_bytes())?
            .map(|bytes| ConfigRecord::decode(&bytes))
            .transpose()
    }

    fn flush(&self) -> Result<()> {
        self.engine.flush()
    }
}
