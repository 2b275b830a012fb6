//! Config Service
//!
//! Resolution and mutation of config records on top of a `ConfigStore`.
//! Inputs arrive already validated; the service only decides what exists.

use std::sync::Arc;

use crate::error::{ConfkvError, Result};
use crate::record::ConfigRecord;
use crate::store::ConfigStore;
use crate::validation::{ConfigChange, VersionedChange};

const NO_CLIENT_CONFIGS: &str = "No configs found for requested client";
const NO_VERSION_CONFIGS: &str = "No configs found for requested client and version";

fn client_not_found() -> ConfkvError {
    ConfkvError::NotFound(NO_CLIENT_CONFIGS.to_string())
}

fn version_not_found() -> ConfkvError {
    ConfkvError::NotFound(NO_VERSION_CONFIGS.to_string())
}

/// Operations exposed over HTTP, independent of transport
#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Create a record holding exactly one entry
    pub fn create(&self, request: VersionedChange) -> Result<ConfigRecord> {
        let VersionedChange {
            client,
            version,
            change,
        } = request;
        let record = ConfigRecord::new(&client, version, change.key, change.value)?;

        self.store
            .insert(&record)
            .map_err(ConfkvError::into_operational)?;

        tracing::debug!(client = %record.client(), version, "Created config");
        Ok(record)
    }

    /// The record with the highest version for `client`
    pub fn get_latest(&self, client: &str) -> Result<ConfigRecord> {
        self.store.find_latest(client)?.ok_or_else(client_not_found)
    }

    /// The record stored under exactly (client, version)
    pub fn get_exact(&self, client: &str, version: i64) -> Result<ConfigRecord> {
        self.store
            .find_one(client, version)?
            .ok_or_else(version_not_found)
    }

    /// Set one entry, keeping every other entry
    pub fn merge_update(&self, client: &str, version: i64, change: ConfigChange) -> Result<ConfigRecord> {
        self.modify(client, version, |record| {
            record.merge_entry(change.key, change.value)
        })
    }

    /// Discard every entry and keep only the given pair
    pub fn replace(&self, client: &str, version: i64, change: ConfigChange) -> Result<ConfigRecord> {
        self.modify(client, version, |record| {
            record.replace_entries(change.key, change.value)
        })
    }

    /// Delete (client, version)
    pub fn delete(&self, client: &str, version: i64) -> Result<()> {
        match self.store.find_one_and_delete(client, version)? {
            Some(_) => {
                tracing::debug!(client, version, "Deleted config");
                Ok(())
            }
            None => Err(version_not_found()),
        }
    }

    fn modify(&self, client: &str, version: i64, apply: impl FnOnce(&mut ConfigRecord)) -> Result<ConfigRecord> {
        let mut record = self.get_exact(client, version)?;
        apply(&mut record);

        // The record may have been deleted between the read and the write.
        if !self.store.save(&record)? {
            return Err(version_not_found());
        }

        tracing::debug!(client, version, entries = record.entries().len(), "Updated config");
        Ok(record)
    }

    /// Make pending writes durable
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
