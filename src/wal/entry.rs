//! WAL Entry definitions
//!
//! One framed log record: `[lsn: u64][crc: u32][len: u32][payload]`, all
//! little-endian. The payload is the bincode encoding of the operation and
//! its timestamp; the CRC covers the payload only.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ConfkvError, Result};

/// Frame header: LSN (8) + CRC (4) + payload length (4)
pub const HEADER_SIZE: usize = 16;

/// Frames claiming a longer payload are treated as corrupt
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

/// Serialized portion of an entry (everything but the LSN)
#[derive(Serialize, Deserialize)]
struct Payload {
    operation: Operation,
    timestamp: u64,
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    fn payload_bytes(&self) -> Result<Vec<u8>> {
        let payload = Payload {
            operation: self.operation.clone(),
            timestamp: self.timestamp,
        };
        Ok(bincode::serialize(&payload)?)
    }

    /// Encode the entry as a complete frame
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = self.payload_bytes()?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode one frame from the start of `bytes`
    ///
    /// Fails with `WalCorruption` on a short buffer or a CRC mismatch.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let header = parse_header(bytes)?;
        let end = HEADER_SIZE + header.len as usize;
        if bytes.len() < end {
            return Err(ConfkvError::WalCorruption(format!(
                "truncated entry: need {} bytes, have {}",
                end,
                bytes.len()
            )));
        }
        Self::from_parts(header, &bytes[HEADER_SIZE..end])
    }

    /// Rebuild an entry from an already-parsed header and its payload
    pub(crate) fn from_parts(header: FrameHeader, payload: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(payload);
        if actual != header.crc {
            return Err(ConfkvError::WalCorruption(format!(
                "CRC mismatch at lsn {}: expected {:#010x}, got {:#010x}",
                header.lsn, header.crc, actual
            )));
        }

        let decoded: Payload = bincode::deserialize(payload)
            .map_err(|e| ConfkvError::WalCorruption(format!("undecodable payload: {}", e)))?;

        Ok(Self {
            lsn: header.lsn,
            operation: decoded.operation,
            timestamp: decoded.timestamp,
        })
    }

    /// Size of the frame `serialize` would produce
    pub fn serialized_size(&self) -> Result<usize> {
        let payload_len = bincode::serialized_size(&Payload {
            operation: self.operation.clone(),
            timestamp: self.timestamp,
        })?;
        Ok(HEADER_SIZE + payload_len as usize)
    }

    /// CRC32 of the payload
    pub fn compute_crc(&self) -> Result<u32> {
        Ok(crc32fast::hash(&self.payload_bytes()?))
    }
}

/// Decoded fixed-size frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

pub(crate) fn parse_header(bytes: &[u8]) -> Result<FrameHeader> {
    if bytes.len() < HEADER_SIZE {
        return Err(ConfkvError::WalCorruption(format!(
            "header too small: {} bytes",
            bytes.len()
        )));
    }

    let mut lsn = [0u8; 8];
    let mut crc = [0u8; 4];
    let mut len = [0u8; 4];
    lsn.copy_from_slice(&bytes[0..8]);
    crc.copy_from_slice(&bytes[8..12]);
    len.copy_from_slice(&bytes[12..16]);

    Ok(FrameHeader {
        lsn: u64::from_le_bytes(lsn),
        crc: u32::from_le_bytes(crc),
        len: u32::from_le_bytes(len),
    })
}
