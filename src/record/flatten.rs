//! Flattened response shape
//!
//! `{ "client": .., "version": .., <entry key>: <entry value>, .. }`

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::ConfigRecord;

const CLIENT_FIELD: &str = "client";
const VERSION_FIELD: &str = "version";

/// Borrowed view of a record serialized with its entries at the top level
#[derive(Debug, Clone, Copy)]
pub struct FlattenedRecord<'a> {
    record: &'a ConfigRecord,
}

impl<'a> FlattenedRecord<'a> {
    pub(super) fn new(record: &'a ConfigRecord) -> Self {
        Self { record }
    }

    /// Entries that can be spread without shadowing an identifying field
    fn spreadable(&self) -> impl Iterator<Item = (&'a String, &'a String)> + 'a {
        let record = self.record;
        record.entries.iter().filter(move |(key, _)| {
            let collides = key.as_str() == CLIENT_FIELD || key.as_str() == VERSION_FIELD;
            if collides {
                tracing::warn!(
                    client = %record.client,
                    version = record.version,
                    key = %key,
                    "Entry key shadows an identifying field; omitted from response"
                );
            }
            !collides
        })
    }
}

impl Serialize for FlattenedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(CLIENT_FIELD, &self.record.client)?;
        map.serialize_entry(VERSION_FIELD, &self.record.version)?;
        for (key, value) in self.spreadable() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
