//! Segment set management: flush, lookup order and compaction

use std::fs;

use confkv::memtable::MemTable;
use confkv::storage::StorageManager;
use tempfile::TempDir;

use super::filled_memtable;

fn segment_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".seg"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_open_empty_directory() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    assert_eq!(storage.segment_count(), 0);
    assert_eq!(storage.next_segment_id(), 1);
    assert_eq!(storage.get(b"anything").unwrap(), None);
}

#[test]
fn test_flush_writes_numbered_segment() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    let segment = storage.flush(&filled_memtable("ios", 10)).unwrap();
    assert_eq!(segment.entry_count(), 10);
    assert_eq!(segment_files(&dir), vec!["segment_000001.seg"]);
    assert_eq!(storage.get(b"ios/004").unwrap(), Some(b"value-4".to_vec()));
}

#[test]
fn test_flush_empty_memtable_fails() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();
    assert!(storage.flush(&MemTable::new()).is_err());
}

#[test]
fn test_newest_segment_wins() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    let first = MemTable::new();
    first.put(b"ios/1".to_vec(), b"old".to_vec());
    first.put(b"ios/2".to_vec(), b"kept".to_vec());
    storage.flush(&first).unwrap();

    let second = MemTable::new();
    second.put(b"ios/1".to_vec(), b"new".to_vec());
    second.delete(b"ios/2".to_vec());
    storage.flush(&second).unwrap();

    assert_eq!(storage.get(b"ios/1").unwrap(), Some(b"new".to_vec()));
    assert_eq!(storage.get(b"ios/2").unwrap(), None);

    let scanned = storage.scan_prefix(b"ios/").unwrap();
    assert_eq!(scanned.get(&b"ios/1".to_vec()), Some(&Some(b"new".to_vec())));
    assert_eq!(scanned.get(&b"ios/2".to_vec()), Some(&None));
}

#[test]
fn test_reopen_discovers_segments() {
    let dir = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(dir.path()).unwrap();
        storage.flush(&filled_memtable("ios", 3)).unwrap();
        storage.flush(&filled_memtable("web", 3)).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let storage = StorageManager::open(dir.path()).unwrap();
    assert_eq!(storage.segment_count(), 2);
    assert_eq!(storage.next_segment_id(), 3);
    assert_eq!(storage.get(b"web/002").unwrap(), Some(b"value-2".to_vec()));
}

#[test]
fn test_compact_merges_and_drops_tombstones() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    storage.flush(&filled_memtable("ios", 5)).unwrap();
    let deletes = MemTable::new();
    deletes.delete(b"ios/000".to_vec());
    deletes.put(b"ios/001".to_vec(), b"updated".to_vec());
    storage.flush(&deletes).unwrap();

    let segment = storage.compact().unwrap().unwrap();
    assert_eq!(segment.entry_count(), 4);
    assert_eq!(storage.segment_count(), 1);
    assert_eq!(segment_files(&dir), vec!["segment_000003.seg"]);
    assert_eq!(storage.get(b"ios/000").unwrap(), None);
    assert_eq!(storage.get(b"ios/001").unwrap(), Some(b"updated".to_vec()));
}

#[test]
fn test_compact_single_segment_is_noop() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();
    storage.flush(&filled_memtable("ios", 2)).unwrap();

    assert!(storage.compact().unwrap().is_none());
    assert_eq!(storage.segment_count(), 1);
}

#[test]
fn test_compact_everything_deleted() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    storage.flush(&filled_memtable("ios", 1)).unwrap();
    let deletes = MemTable::new();
    deletes.delete(b"ios/000".to_vec());
    storage.flush(&deletes).unwrap();

    assert!(storage.compact().unwrap().is_none());
    assert_eq!(storage.segment_count(), 0);
    assert!(segment_files(&dir).is_empty());
}
