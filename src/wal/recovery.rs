//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{ConfkvError, Result};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether anything past the last valid entry was (or would be) cut off
    pub was_truncated: bool,
}

/// Scan outcome shared by `recover` and `verify`
struct Scan {
    entries: Vec<WalEntry>,
    result: RecoveryResult,
    valid_len: u64,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Stop at the first corrupted entry (nothing after it is trusted)
    /// 3. Truncate the file after the last valid entry
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let scan = Self::scan(path, true)?;

        if scan.result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                valid_len = scan.valid_len,
                corrupted = scan.result.entries_corrupted,
                "Truncated damaged WAL tail"
            );
        }

        Ok((scan.entries, scan.result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Ok(Self::scan(path, false)?.result)
    }

    fn scan(path: &Path, keep_entries: bool) -> Result<Scan> {
        let file_len = std::fs::metadata(path)?.len();
        let mut reader = WalReader::open(path)?;

        let mut entries = Vec::new();
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
        };

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    if keep_entries {
                        entries.push(entry);
                    }
                }
                Ok(None) => break,
                Err(ConfkvError::WalCorruption(reason)) => {
                    tracing::warn!(path = %path.display(), %reason, "Corrupted WAL entry");
                    result.entries_corrupted += 1;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let valid_len = reader.valid_offset();
        result.was_truncated = valid_len < file_len;

        Ok(Scan {
            entries,
            result,
            valid_len,
        })
    }
}
