//! Shared fixtures for the integration tests.

use std::path::PathBuf;

use keeper_core::Config;
use keeper_vault::VaultStore;
use tempfile::TempDir;

/// A throwaway data directory laid out the way the CLI lays it out.
pub struct TestHome {
    pub dir: TempDir,
    pub config: Config,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
            config: Config::default(),
        }
    }

    pub fn key_path(&self) -> PathBuf {
        self.config.key_path(self.dir.path())
    }

    pub fn data_path(&self) -> PathBuf {
        self.config.data_path(self.dir.path())
    }

    /// Open the vault the way a fresh process would.
    pub fn open(&self) -> VaultStore {
        VaultStore::from_config(self.dir.path(), &self.config).expect("open vault")
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}
