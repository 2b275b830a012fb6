//! In-memory record store

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::{ConfkvError, Result};
use crate::record::{ConfigRecord, UNIQUE_FIELDS};

use super::ConfigStore;

/// Records kept in an ordered map keyed by (client, version)
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(String, i64), ConfigRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn slot(client: &str, version: i64) -> (String, i64) {
    (client.to_string(), version)
}

impl ConfigStore for MemoryStore {
    fn insert(&self, record: &ConfigRecord) -> Result<()> {
        let mut records = self.records.write();
        let key = slot(record.client(), record.version());
        if records.contains_key(&key) {
            return Err(ConfkvError::DuplicateKey {
                fields: UNIQUE_FIELDS.to_vec(),
            });
        }
        records.insert(key, record.clone());
        Ok(())
    }

    fn find_one(&self, client: &str, version: i64) -> Result<Option<ConfigRecord>> {
        Ok(self.records.read().get(&slot(client, version)).cloned())
    }

    fn find_latest(&self, client: &str) -> Result<Option<ConfigRecord>> {
        let records = self.records.read();
        Ok(records
            .range(slot(client, i64::MIN)..=slot(client, i64::MAX))
            .next_back()
            .map(|(_, record)| record.clone()))
    }

    fn save(&self, record: &ConfigRecord) -> Result<bool> {
        let mut records = self.records.write();
        match records.get_mut(&slot(record.client(), record.version())) {
            Some(stored) => {
                *stored = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_one_and_delete(&self, client: &str, version: i64) -> Result<Option<ConfigRecord>> {
        Ok(self.records.write().remove(&slot(client, version)))
    }
}
