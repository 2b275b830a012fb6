//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{ConfkvError, Result};

use super::{Operation, WalEntry};

/// Writes entries to the WAL file
///
/// Opening a writer starts a fresh log, so any existing WAL must be
/// recovered (see `WalRecovery`) before the writer is opened.
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN the next appended entry will receive
    next_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries handed to the OS since the last fsync
    uncommitted: usize,
}

impl WalWriter {
    /// Open or create a WAL file, discarding previous contents
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            next_lsn: 1,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append an operation, returning the LSN assigned to it
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let frame = WalEntry::new(lsn, operation).serialize()?;

        self.writer.write_all(&frame).map_err(|e| {
            ConfkvError::Storage(format!("WAL append to {} failed: {}", self.path.display(), e))
        })?;
        // Hand the frame to the OS before acknowledging; fsync follows the strategy.
        self.writer.flush()?;

        self.next_lsn += 1;
        self.uncommitted += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Drop every entry and restart numbering at LSN 1
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;

        self.next_lsn = 1;
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the LSN the next append will use
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries appended but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
