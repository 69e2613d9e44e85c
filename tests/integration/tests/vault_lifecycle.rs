//! Vault lifecycle integration tests.
//!
//! Each `open()` builds a new `VaultStore` from disk, standing in for a
//! separate run of the program against the same data directory.

use keeper_integration_tests::TestHome;
use keeper_vault::{FieldRecord, SharedVault, VaultError, VaultStore};

#[test]
fn test_key_persists_across_runs() {
    let home = TestHome::new();

    let mut first = home.open();
    first
        .encrypt_and_store("Wallet", "cold-1", "seedphrase123,privkeyABC")
        .unwrap();
    let fingerprint = first.key_fingerprint();
    drop(first);

    let key_before = std::fs::read_to_string(home.key_path()).unwrap();

    let second = home.open();
    assert_eq!(second.key_fingerprint(), fingerprint);
    assert_eq!(
        second
            .decrypt_and_retrieve("Wallet", "cold-1")
            .unwrap()
            .unwrap()
            .expose(),
        "seedphrase123,privkeyABC"
    );
    assert_eq!(std::fs::read_to_string(home.key_path()).unwrap(), key_before);
}

#[test]
fn test_wallet_scenario_across_runs() {
    let home = TestHome::new();

    home.open()
        .encrypt_and_store("Wallet", "cold-1", "seedphrase123,privkeyABC")
        .unwrap();

    let mut vault = home.open();
    assert_eq!(
        vault
            .decrypt_and_retrieve("Wallet", "cold-1")
            .unwrap()
            .unwrap()
            .expose(),
        "seedphrase123,privkeyABC"
    );
    assert!(vault.delete("Wallet", "cold-1").unwrap());

    let vault = home.open();
    assert!(vault.decrypt_and_retrieve("Wallet", "cold-1").unwrap().is_none());
    assert!(vault.identifiers("Wallet").is_empty());
}

#[test]
fn test_replaced_key_file_is_detected_not_decoded() {
    let home = TestHome::new();
    home.open()
        .encrypt_and_store("Exchange", "binance", "alice,hunter2")
        .unwrap();

    // Simulate copying the data file next to a different installation's key.
    std::fs::write(home.key_path(), "0f".repeat(32)).unwrap();

    let vault = home.open();
    let err = vault.decrypt_and_retrieve("Exchange", "binance").unwrap_err();
    assert!(err.is_integrity_failure(), "unexpected error: {err}");
    assert!(!vault.verify().is_clean());
}

#[test]
fn test_truncated_key_file_refuses_to_open() {
    let home = TestHome::new();
    home.open().encrypt_and_store("Wallet", "a", "b").unwrap();

    let key = std::fs::read_to_string(home.key_path()).unwrap();
    std::fs::write(home.key_path(), &key[..40]).unwrap();

    let result = VaultStore::from_config(home.dir.path(), &home.config);
    assert!(matches!(result, Err(VaultError::KeyFormat { .. })));
}

#[test]
fn test_lost_key_file_is_not_regenerated() {
    let home = TestHome::new();
    home.open()
        .encrypt_and_store("Wallet", "cold-1", "seedphrase123,privkeyABC")
        .unwrap();
    std::fs::remove_file(home.key_path()).unwrap();

    for _ in 0..2 {
        let result = VaultStore::from_config(home.dir.path(), &home.config);
        assert!(matches!(result, Err(VaultError::MissingKey { .. })));
        assert!(!home.key_path().exists());
    }

    let value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(home.data_path()).unwrap()).unwrap();
    assert_eq!(value["Wallet"].as_object().unwrap().len(), 1);
}

#[test]
fn test_corrupt_data_file_is_preserved() {
    let home = TestHome::new();
    home.open().encrypt_and_store("Wallet", "a", "b").unwrap();

    let mut raw = std::fs::read(home.data_path()).unwrap();
    raw.truncate(raw.len() / 2);
    std::fs::write(home.data_path(), &raw).unwrap();

    let result = VaultStore::from_config(home.dir.path(), &home.config);
    assert!(matches!(result, Err(VaultError::Load { .. })));
    assert_eq!(std::fs::read(home.data_path()).unwrap(), raw);
}

#[test]
fn test_field_records_through_shared_vault() {
    let home = TestHome::new();
    let vault = SharedVault::new(home.open());

    let fields = FieldRecord::new()
        .with("seed", "abandon ability able about")
        .with("private_key", "0x4c0883a69102937d6231471b5dbb6204fe512961");
    vault.store_fields("Wallet", "ledger", &fields).unwrap();

    let reopened = home.open();
    let loaded = reopened.retrieve_fields("Wallet", "ledger").unwrap().unwrap();
    assert_eq!(loaded.get("seed"), Some("abandon ability able about"));
    assert_eq!(loaded, fields);
}

#[test]
fn test_data_file_is_plain_category_map() {
    let home = TestHome::new();
    let mut vault = home.open();
    vault.encrypt_and_store("Wallet", "cold-1", "x").unwrap();
    vault.encrypt_and_store("Others", "note", "y").unwrap();

    let value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(home.data_path()).unwrap()).unwrap();
    let object = value.as_object().unwrap();
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Others", "Wallet"]);
    assert!(object["Wallet"]["cold-1"].is_string());
}
