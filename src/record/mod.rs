//! Config Record Model
//!
//! A `ConfigRecord` is one configuration snapshot: the entries a client sees
//! at a given version. Records are unique per (client, version).

mod flatten;
mod key;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfkvError, Result};

pub use flatten::FlattenedRecord;
pub use key::RecordKey;

/// String-to-string payload of a record
pub type Entries = BTreeMap<String, String>;

/// Fields that make up the uniqueness constraint, in report order
pub const UNIQUE_FIELDS: [&str; 2] = ["client", "version"];

/// A stored configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    client: String,
    version: i64,
    entries: Entries,
}

impl ConfigRecord {
    /// Build a record seeded with a single entry
    ///
    /// `client` is trimmed and must not be empty afterwards.
    pub fn new(client: &str, version: i64, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let client = client.trim();
        if client.is_empty() {
            return Err(ConfkvError::InvalidInput(
                "Invalid input data. A config must have a client provided".to_string(),
            ));
        }

        let mut entries = Entries::new();
        entries.insert(key.into(), value.into());

        Ok(Self {
            client: client.to_string(),
            version,
            entries,
        })
    }

    /// Rebuild a record from stored parts (no normalization)
    pub fn from_parts(client: String, version: i64, entries: Entries) -> Self {
        Self {
            client,
            version,
            entries,
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    /// Storage key for this record
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.client, self.version)
    }

    /// Insert or overwrite one entry, leaving the others untouched
    pub fn merge_entry(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Drop every entry and keep only the given pair
    pub fn replace_entries(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.clear();
        self.entries.insert(key.into(), value.into());
    }

    /// Response view with entries spread next to `client` and `version`
    pub fn flatten(&self) -> FlattenedRecord<'_> {
        FlattenedRecord::new(self)
    }

    /// Encode for storage
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a stored record
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
