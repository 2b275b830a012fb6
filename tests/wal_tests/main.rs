//! Write-ahead log tests

mod recovery;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use confkv::config::WalSyncStrategy;
use confkv::wal::{Operation, WalEntry, WalWriter};
use tempfile::TempDir;

pub fn temp_wal() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wal.log");
    (dir, path)
}

pub fn put(key: &str, value: &str) -> Operation {
    Operation::Put {
        key: key.as_bytes().to_vec(),
        value: value.as_bytes().to_vec(),
    }
}

pub fn del(key: &str) -> Operation {
    Operation::Delete {
        key: key.as_bytes().to_vec(),
    }
}

/// Append `count` puts through a writer that syncs every write
pub fn write_puts(path: &Path, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer.append(put(&format!("ios/{}", i), "dark")).unwrap();
    }
}

/// Write raw bytes, for crafting damaged logs
pub fn write_raw(path: &Path, chunks: &[&[u8]]) {
    let mut file = File::create(path).unwrap();
    for chunk in chunks {
        file.write_all(chunk).unwrap();
    }
    file.sync_all().unwrap();
}

pub fn frame(lsn: u64, op: Operation) -> Vec<u8> {
    WalEntry::new(lsn, op).serialize().unwrap()
}
