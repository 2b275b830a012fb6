//! Record model, key encoding and response shape

use confkv::record::{ConfigRecord, Entries, RecordKey};
use confkv::ConfkvError;
use serde_json::json;

#[test]
fn test_new_trims_client_and_seeds_entry() {
    let record = ConfigRecord::new("  ios\t", 109, "theme", "dark").unwrap();

    assert_eq!(record.client(), "ios");
    assert_eq!(record.version(), 109);
    assert_eq!(record.entries().len(), 1);
    assert_eq!(record.entries().get("theme").map(String::as_str), Some("dark"));
}

#[test]
fn test_blank_client_rejected() {
    let err = ConfigRecord::new("   ", 1, "k", "v").unwrap_err();
    assert!(matches!(err, ConfkvError::InvalidInput(_)));
    assert_eq!(
        err.to_string(),
        "Invalid input data. A config must have a client provided"
    );
}

#[test]
fn test_merge_and_replace_entries() {
    let mut record = ConfigRecord::new("ios", 1, "a", "1").unwrap();

    record.merge_entry("b", "2");
    record.merge_entry("a", "updated");
    assert_eq!(record.entries().len(), 2);
    assert_eq!(record.entries()["a"], "updated");

    record.replace_entries("c", "3");
    let mut expected = Entries::new();
    expected.insert("c".to_string(), "3".to_string());
    assert_eq!(record.entries(), &expected);
}

#[test]
fn test_encode_decode() {
    let mut record = ConfigRecord::new("android", -4, "", "").unwrap();
    record.merge_entry("ünïcode", "✓");

    let decoded = ConfigRecord::decode(&record.encode().unwrap()).unwrap();
    assert_eq!(decoded, record);
    assert!(ConfigRecord::decode(&[0xFF]).is_err());
}

#[test]
fn test_flattened_json_shape() {
    let mut record = ConfigRecord::new("ios", 109, "theme", "dark").unwrap();
    record.merge_entry("font", "large");

    let value = serde_json::to_value(record.flatten()).unwrap();
    assert_eq!(
        value,
        json!({"client": "ios", "version": 109, "theme": "dark", "font": "large"})
    );
}

#[test]
fn test_flatten_keeps_identifying_fields() {
    let mut entries = Entries::new();
    entries.insert("client".to_string(), "spoofed".to_string());
    entries.insert("version".to_string(), "999".to_string());
    entries.insert("k".to_string(), "v".to_string());
    let record = ConfigRecord::from_parts("ios".to_string(), 1, entries);

    let value = serde_json::to_value(record.flatten()).unwrap();
    assert_eq!(value, json!({"client": "ios", "version": 1, "k": "v"}));
}

#[test]
fn test_record_key_orders_by_version() {
    let versions = [i64::MIN, -10, -1, 1, 2, 109, 110, i64::MAX];
    let keys: Vec<_> = versions.iter().map(|v| RecordKey::new("ios", *v)).collect();

    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    for key in &keys {
        assert!(key.as_bytes().starts_with(&RecordKey::prefix("ios")));
    }
}

#[test]
fn test_record_key_decode() {
    let key = RecordKey::new("web app", 42);
    assert_eq!(
        RecordKey::decode(key.as_bytes()),
        Some(("web app".to_string(), 42))
    );

    assert_eq!(RecordKey::decode(b"short"), None);
    assert_eq!(RecordKey::decode(b"no separator here"), None);
}

#[test]
fn test_record_key_prefix_is_per_client() {
    let ios = RecordKey::new("ios", 1);
    let ios_beta = RecordKey::new("ios-beta", 1);

    assert!(!ios_beta.as_bytes().starts_with(&RecordKey::prefix("ios")));
    assert!(ios.as_bytes().starts_with(&RecordKey::prefix("ios")));
}
