//! Config save/load roundtrip integration tests.

use keeper_core::config::{Config, LogLevel};
use keeper_integration_tests::TestHome;
use keeper_vault::VaultStore;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keeper.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keeper.json5");

    let mut config = Config::default();
    config.logging.level = LogLevel::Warn;
    config.vault.data_file = "vault.json".to_string();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.logging.level, LogLevel::Warn);
    assert_eq!(loaded.vault.data_file, "vault.json");
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/keeper.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}

#[test]
fn test_configured_file_names_are_used() {
    let mut home = TestHome::new();
    home.config.vault.key_file = "secret.key".to_string();
    home.config.vault.data_file = "records.json".to_string();

    home.open().encrypt_and_store("Wallet", "a", "b").unwrap();

    assert!(home.dir.path().join("secret.key").exists());
    assert!(home.dir.path().join("records.json").exists());
    assert!(!home.dir.path().join("key.txt").exists());

    let vault = VaultStore::from_config(home.dir.path(), &home.config).unwrap();
    assert_eq!(vault.decrypt_and_retrieve("Wallet", "a").unwrap().unwrap().expose(), "b");
}
