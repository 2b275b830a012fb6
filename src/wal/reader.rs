//! WAL Reader
//!
//! Sequential frame reader. A frame cut short by a crash (partial header or
//! partial payload) ends the log; a complete frame with a bad CRC is reported
//! as `WalCorruption`.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ConfkvError, Result};

use super::entry::{parse_header, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use super::WalEntry;

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset just past the last frame that decoded cleanly
    valid_offset: u64,
    /// Set once a partial frame has been seen at the tail
    torn_tail: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            valid_offset: 0,
            torn_tail: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at end of file or at a torn tail.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.torn_tail {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        let got = self.fill(&mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            self.torn_tail = true;
            return Ok(None);
        }

        let header = parse_header(&header)?;
        if header.len as usize > MAX_PAYLOAD_SIZE {
            return Err(ConfkvError::WalCorruption(format!(
                "implausible payload length {} at lsn {}",
                header.len, header.lsn
            )));
        }
        let mut payload = vec![0u8; header.len as usize];
        if self.fill(&mut payload)? < payload.len() {
            self.torn_tail = true;
            return Ok(None);
        }

        let entry = WalEntry::from_parts(header, &payload)?;
        self.valid_offset += (HEADER_SIZE + payload.len()) as u64;
        Ok(Some(entry))
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Offset of the end of the last cleanly decoded frame
    pub fn valid_offset(&self) -> u64 {
        self.valid_offset
    }

    /// Whether reading stopped at an incomplete frame
    pub fn hit_torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Read until `buf` is full or EOF, returning the bytes read
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Iterator over WAL entries
///
/// Yields the first error and then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
