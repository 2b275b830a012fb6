//! Record key encoding
//!
//! ```text
//! ┌────────────────────┬──────┬──────────────────────────────┐
//! │ client (UTF-8)     │ 0x00 │ version: i64 BE, sign flipped │
//! └────────────────────┴──────┴──────────────────────────────┘
//! ```
//!
//! Flipping the sign bit makes the big-endian bytes sort like the signed
//! integer, so for one client the engine's key order is version order and
//! the newest version is the last key under the client prefix.

const SEPARATOR: u8 = 0x00;
const SIGN_BIT: u64 = 1 << 63;
const VERSION_LEN: usize = 8;

/// Encoded (client, version) storage key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordKey(Vec<u8>);

impl RecordKey {
    pub fn new(client: &str, version: i64) -> Self {
        let mut bytes = Self::prefix(client);
        bytes.extend_from_slice(&((version as u64) ^ SIGN_BIT).to_be_bytes());
        Self(bytes)
    }

    /// Prefix shared by every version of `client`
    pub fn prefix(client: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(client.len() + 1 + VERSION_LEN);
        bytes.extend_from_slice(client.as_bytes());
        bytes.push(SEPARATOR);
        bytes
    }

    /// Split raw key bytes back into (client, version)
    ///
    /// Returns `None` for bytes that are not a record key.
    pub fn decode(bytes: &[u8]) -> Option<(String, i64)> {
        if bytes.len() < 1 + VERSION_LEN {
            return None;
        }
        let (head, tail) = bytes.split_at(bytes.len() - VERSION_LEN);
        let (client, separator) = head.split_at(head.len() - 1);
        if separator != [SEPARATOR] {
            return None;
        }

        let mut raw = [0u8; VERSION_LEN];
        raw.copy_from_slice(tail);
        let version = (u64::from_be_bytes(raw) ^ SIGN_BIT) as i64;
        let client = String::from_utf8(client.to_vec()).ok()?;
        Some((client, version))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for RecordKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
