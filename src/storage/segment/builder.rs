//! Segment Builder
//!
//! Writes sorted key-value entries to a new segment file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{ConfkvError, Result};

use super::{Segment, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Builder for creating new segments from sorted entries
pub struct SegmentBuilder {
    path: PathBuf,
    writer: BufWriter<File>,
    entry_count: u64,
    /// Offset where the next entry will start
    current_offset: u64,
    /// key → file offset of its entry
    index: Vec<(Vec<u8>, u64)>,
    /// Running CRC over the data block
    data_hasher: crc32fast::Hasher,
}

impl SegmentBuilder {
    /// Create a new segment builder
    ///
    /// Writes the header immediately; call `add()`/`add_tombstone()` in
    /// ascending key order, then `finish()`.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?; // entry count, patched in finish

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE,
            index: Vec::new(),
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a key-value pair
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_entry(key, Some(value))
    }

    /// Add a tombstone
    pub fn add_tombstone(&mut self, key: &[u8]) -> Result<()> {
        self.write_entry(key, None)
    }

    fn write_entry(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if let Some((last, _)) = self.index.last() {
            if key <= last.as_slice() {
                return Err(ConfkvError::Storage(format!(
                    "segment keys must be strictly ascending ({})",
                    self.path.display()
                )));
            }
        }
        self.index.push((key.to_vec(), self.current_offset));

        let key_len = (key.len() as u32).to_le_bytes();
        let val_len = match value {
            Some(v) => v.len() as u32,
            None => TOMBSTONE_MARKER,
        }
        .to_le_bytes();

        let chunks: [&[u8]; 4] = [&key_len, &val_len, key, value.unwrap_or_default()];
        for chunk in chunks {
            self.writer.write_all(chunk)?;
            self.data_hasher.update(chunk);
            self.current_offset += chunk.len() as u64;
        }

        self.entry_count += 1;
        Ok(())
    }

    /// Write index block and footer, returning the segment metadata
    pub fn finish(mut self) -> Result<Segment> {
        let index_offset = self.current_offset;

        for (key, offset) in &self.index {
            self.writer.write_all(&(key.len() as u32).to_le_bytes())?;
            self.writer.write_all(&offset.to_le_bytes())?;
            self.writer.write_all(key)?;
        }

        let data_crc = self.data_hasher.finalize();
        self.writer.write_all(&index_offset.to_le_bytes())?;
        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;
        self.writer.flush()?;

        let mut file = self.writer.into_inner().map_err(|e| {
            ConfkvError::Storage(format!("Failed to flush segment: {}", e))
        })?;
        file.seek(SeekFrom::Start(MAGIC.len() as u64 + 2))?;
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        let min_key = self.index.first().map(|(k, _)| k.clone()).unwrap_or_default();
        let max_key = self.index.last().map(|(k, _)| k.clone()).unwrap_or_default();

        Ok(Segment {
            path: self.path,
            entry_count: self.entry_count,
            min_key,
            max_key,
            file_size,
        })
    }
}
