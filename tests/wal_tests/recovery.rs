//! Startup recovery: replay, verify and tail truncation

use std::fs;

use confkv::wal::{Operation, WalRecovery};

use super::{del, frame, put, temp_wal, write_puts, write_raw};

#[test]
fn test_clean_log_recovers_everything() {
    let (_dir, path) = temp_wal();
    write_puts(&path, 12);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 12);
    assert_eq!(result.entries_recovered, 12);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 12);
    assert!(!result.was_truncated);
}

#[test]
fn test_empty_log() {
    let (_dir, path) = temp_wal();
    write_raw(&path, &[]);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert!(entries.is_empty());
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_operations_keep_their_order() {
    let (_dir, path) = temp_wal();
    write_raw(
        &path,
        &[
            &frame(1, put("web/1", "a")),
            &frame(2, del("web/1")),
            &frame(3, put("web/2", "b")),
        ],
    );

    let (entries, _) = WalRecovery::recover(&path).unwrap();
    assert!(matches!(entries[0].operation, Operation::Put { .. }));
    assert!(matches!(entries[1].operation, Operation::Delete { .. }));
    assert!(matches!(entries[2].operation, Operation::Put { .. }));
}

#[test]
fn test_torn_tail_is_cut_off() {
    let (_dir, path) = temp_wal();
    let good = frame(1, put("ios/1", "a"));
    let torn = frame(2, put("ios/2", "b"));
    write_raw(&path, &[&good, &torn[..20]]);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_corrupted, 0);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), good.len() as u64);
}

#[test]
fn test_corrupt_entry_stops_replay() {
    let (_dir, path) = temp_wal();
    let good = frame(1, put("ios/1", "a"));
    let mut bad = frame(2, put("ios/2", "b"));
    bad[20] ^= 0xFF;
    write_raw(&path, &[&good, &bad, &frame(3, put("ios/3", "c"))]);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), good.len() as u64);
}

#[test]
fn test_corrupt_first_entry_recovers_nothing() {
    let (_dir, path) = temp_wal();
    let mut bad = frame(1, put("ios/1", "a"));
    bad[20] ^= 0xFF;
    write_raw(&path, &[&bad]);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert!(entries.is_empty());
    assert_eq!(result.entries_corrupted, 1);
    assert!(result.was_truncated);
}

#[test]
fn test_verify_leaves_the_file_alone() {
    let (_dir, path) = temp_wal();
    let good = frame(1, put("ios/1", "a"));
    write_raw(&path, &[&good, &[0u8; 5]]);

    let result = WalRecovery::verify(&path).unwrap();
    assert_eq!(result.entries_recovered, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), good.len() as u64 + 5);
}

#[test]
fn test_recover_and_verify_agree() {
    let (_dir, path) = temp_wal();
    write_puts(&path, 20);

    let (entries, recovered) = WalRecovery::recover(&path).unwrap();
    let verified = WalRecovery::verify(&path).unwrap();
    assert_eq!(entries.len() as u64, recovered.entries_recovered);
    assert_eq!(recovered, verified);
}
