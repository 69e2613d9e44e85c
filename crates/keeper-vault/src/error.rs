//! Error types for the vault.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during vault operations.
///
/// A missing record is not an error; lookups return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid key file {path}: {reason}")]
    KeyFormat { path: PathBuf, reason: String },

    #[error("Key file {path} could not be accessed: {source}")]
    KeyStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Key file {key_path} is missing but {data_path} holds records encrypted with it")]
    MissingKey { key_path: PathBuf, data_path: PathBuf },

    #[error("Corrupt record {category}/{identifier}: {reason}")]
    CorruptRecord {
        category: String,
        identifier: String,
        reason: String,
    },

    #[error("Padding check failed for {category}/{identifier}: wrong key file or tampered record")]
    Padding { category: String, identifier: String },

    #[error("Record {category}/{identifier} is not valid UTF-8 (first bad byte at offset {offset})")]
    Encoding {
        category: String,
        identifier: String,
        offset: usize,
    },

    #[error("Failed to load vault file {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to write vault file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Vault file {path} uses the legacy shared-IV layout and must be migrated")]
    LegacyLayout { path: PathBuf },

    #[error("Legacy migration failed: {0}")]
    Migration(String),

    #[error("Invalid field record: {0}")]
    FieldRecord(String),
}

impl VaultError {
    /// Whether this error points at a wrong key file or tampered data rather
    /// than an I/O or format problem.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            VaultError::CorruptRecord { .. } | VaultError::Padding { .. } | VaultError::Encoding { .. }
        )
    }
}

/// Convenience result alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
