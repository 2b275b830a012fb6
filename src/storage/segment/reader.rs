//! Segment Reader
//!
//! Opens segment files and serves point lookups and prefix scans through an
//! in-memory index. The file handle sits behind a mutex so lookups only need
//! `&self`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{ConfkvError, Result};

use super::iterator::SegmentIterator;
use super::{read_u32, read_u64, FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Reader for segment files with in-memory index for O(log n) lookups
pub struct SegmentReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// key → file offset of its entry
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
    /// Start of the index block (end of data)
    index_offset: u64,
}

impl SegmentReader {
    /// Open a segment, validating header, footer and data checksum
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(ConfkvError::Storage(format!(
                "Segment {} too small ({} bytes)",
                path.display(),
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        if &header[0..4] != MAGIC {
            return Err(ConfkvError::Storage(format!(
                "Invalid segment magic in {}: {:?}",
                path.display(),
                &header[0..4]
            )));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(ConfkvError::Storage(format!(
                "Unsupported segment version: {}",
                version
            )));
        }
        let entry_count = read_u64(&header, 6);

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;
        let index_offset = read_u64(&footer, 0);
        let data_crc = read_u32(&footer, 8);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(ConfkvError::Storage(format!(
                "Segment {} has index offset {} out of bounds",
                path.display(),
                index_offset
            )));
        }

        Self::verify_data_crc(&mut file, index_offset, data_crc, path)?;

        let mut index_data = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.seek(SeekFrom::Start(index_offset))?;
        file.read_exact(&mut index_data)?;
        let index = Self::parse_index(&index_data);

        if index.len() as u64 != entry_count {
            return Err(ConfkvError::Storage(format!(
                "Segment {} index holds {} keys, header says {}",
                path.display(),
                index.len(),
                entry_count
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
            index_offset,
        })
    }

    fn verify_data_crc(file: &mut File, end: u64, expected: u32, path: &Path) -> Result<()> {
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut remaining = end - HEADER_SIZE;
        let mut hasher = crc32fast::Hasher::new();
        let mut chunk = [0u8; 8192];
        while remaining > 0 {
            let n = remaining.min(chunk.len() as u64) as usize;
            file.read_exact(&mut chunk[..n])?;
            hasher.update(&chunk[..n]);
            remaining -= n as u64;
        }

        let actual = hasher.finalize();
        if actual != expected {
            return Err(ConfkvError::Storage(format!(
                "Segment {} data CRC mismatch: expected {:#010x}, got {:#010x}",
                path.display(),
                expected,
                actual
            )));
        }
        Ok(())
    }

    /// Parse `[key_len(4)][offset(8)][key]` records; a truncated tail is ignored
    fn parse_index(data: &[u8]) -> BTreeMap<Vec<u8>, u64> {
        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos + 12 <= data.len() {
            let key_len = read_u32(data, pos) as usize;
            let offset = read_u64(data, pos + 4);
            pos += 12;
            if pos + key_len > data.len() {
                break;
            }
            index.insert(data[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }
        index
    }

    /// Read the value stored at an entry offset (`None` for a tombstone)
    fn read_value_at(file: &mut BufReader<File>, offset: u64) -> Result<Option<Vec<u8>>> {
        file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        let key_len = read_u32(&header, 0);
        let val_len = read_u32(&header, 4);

        file.seek(SeekFrom::Current(key_len as i64))?;
        if val_len == TOMBSTONE_MARKER {
            return Ok(None);
        }

        let mut value = vec![0u8; val_len as usize];
        file.read_exact(&mut value)?;
        Ok(Some(value))
    }

    /// Get a value by key
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key found but is a tombstone
    /// - `Err(KeyNotFound)`: key not in this segment
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let offset = *self.index.get(key).ok_or(ConfkvError::KeyNotFound)?;
        let mut file = self.file.lock();
        Self::read_value_at(&mut file, offset)
    }

    /// All entries whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Option<Vec<u8>>)>> {
        let mut file = self.file.lock();
        self.index
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, &offset)| Ok((k.clone(), Self::read_value_at(&mut file, offset)?)))
            .collect()
    }

    /// Keys starting with `prefix`, served from the index without file I/O
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.index
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(k, _)| k.as_slice())
            .take_while(move |k| k.starts_with(prefix))
    }

    /// Every entry in the segment, tombstones included
    pub fn entries(&self) -> Result<Vec<(Vec<u8>, Option<Vec<u8>>)>> {
        let mut file = self.file.lock();
        SegmentIterator::new(&mut file, self.index_offset)?.collect()
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Range check: false only if the key is definitely outside this segment
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
