//! Migration of data files written with a single shared IV.
//!
//! The first releases stored one IV for the whole vault under a top-level
//! `"iv"` key and encrypted every record with it, without an IV prefix. That
//! makes identical plaintexts produce identical ciphertexts. Migration
//! decrypts each record with the shared IV and re-encrypts it with its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use keeper_core::SecretString;
use tracing::{info, warn};

use crate::crypto::{self, IV_SIZE};
use crate::error::{Result, VaultError};
use crate::keystore::MasterKey;
use crate::store::{self, VaultData, LEGACY_IV_KEY};

/// Report of what the migration did.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Number of records re-encrypted, per category.
    pub migrated: BTreeMap<String, usize>,
    /// Where the original file was copied before rewriting.
    pub backup: Option<PathBuf>,
}

impl MigrationReport {
    /// True when the file was already in the current layout (or absent).
    pub fn is_noop(&self) -> bool {
        self.backup.is_none()
    }

    /// Total records re-encrypted.
    pub fn total(&self) -> usize {
        self.migrated.values().sum()
    }
}

/// Convert a legacy shared-IV data file at `path` to the per-record IV layout.
///
/// All records are decrypted before anything is written; if any of them fails
/// (wrong key, damaged record) the file is left exactly as it was. On success
/// the original bytes are kept in a timestamped `.bak` file next to it.
pub fn migrate_legacy(path: &Path, key: &MasterKey) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no data file -- nothing to migrate");
            return Ok(report);
        }
        Err(e) => {
            return Err(VaultError::Load {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let value: serde_json::Value = serde_json::from_slice(&raw).map_err(|e| VaultError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !store::is_legacy_layout(&value) {
        // Validates the current layout so a damaged file is not reported as migrated.
        store::parse_vault_data(path, &raw)?;
        info!(path = %path.display(), "data file already uses per-record IVs");
        return Ok(report);
    }

    let serde_json::Value::Object(entries) = value else {
        return Err(VaultError::Migration("legacy file is not a JSON object".to_string()));
    };

    let shared_iv = entries
        .get(LEGACY_IV_KEY)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| VaultError::Migration("legacy IV is missing".to_string()))
        .and_then(parse_shared_iv)?;

    let mut migrated = VaultData::new();
    for (category, records) in &entries {
        if category == LEGACY_IV_KEY {
            continue;
        }
        let records = records.as_object().ok_or_else(|| {
            VaultError::Migration(format!("category '{category}' is not an object"))
        })?;

        let target = migrated.entry(category.clone()).or_default();
        for (identifier, encoded) in records {
            let encoded = encoded.as_str().ok_or_else(|| {
                VaultError::Migration(format!("record {category}/{identifier} is not a string"))
            })?;
            let plaintext = decrypt_shared_iv(key, &shared_iv, encoded)
                .map_err(|e| VaultError::Migration(format!("record {category}/{identifier}: {e}")))?;
            target.insert(
                identifier.clone(),
                crypto::encrypt_record(key, plaintext.expose_secret().as_bytes()),
            );
        }
        report.migrated.insert(category.clone(), target.len());
    }
    migrated.retain(|_, records| !records.is_empty());

    let backup = backup_path(path);
    write_backup(&backup, &raw)?;
    store::write_vault_file(path, &migrated)?;

    warn!(
        path = %path.display(),
        backup = %backup.display(),
        records = report.total(),
        "migrated legacy shared-IV data file"
    );
    report.backup = Some(backup);
    Ok(report)
}

fn parse_shared_iv(encoded: &str) -> Result<[u8; IV_SIZE]> {
    let bytes = hex::decode(encoded.trim())
        .map_err(|e| VaultError::Migration(format!("legacy IV is not hex: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        VaultError::Migration(format!(
            "legacy IV is {} bytes, expected {IV_SIZE}",
            bytes.len()
        ))
    })
}

fn decrypt_shared_iv(
    key: &MasterKey,
    iv: &[u8; IV_SIZE],
    encoded: &str,
) -> std::result::Result<SecretString, String> {
    let body = STANDARD
        .decode(encoded)
        .map_err(|e| format!("base64 decode failed: {e}"))?;
    let plaintext = crypto::decrypt_with_iv(key, iv, &body).map_err(|failure| match failure {
        crypto::CipherFailure::Padding => "padding check failed (wrong key file?)".to_string(),
        crypto::CipherFailure::Corrupt(reason) => reason,
        crypto::CipherFailure::Encoding(offset) => format!("invalid UTF-8 at offset {offset}"),
    })?;
    SecretString::from_utf8(plaintext.to_vec())
        .map_err(|offset| format!("invalid UTF-8 at offset {offset}"))
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "legacy_data.json".to_string());
    path.with_file_name(format!("{name}.legacy-{stamp}.bak"))
}

fn write_backup(path: &Path, raw: &[u8]) -> Result<()> {
    use std::io::Write;

    let persistence = |source: std::io::Error| VaultError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(persistence)?;
    file.write_all(raw).map_err(persistence)?;
    file.sync_all().map_err(persistence)
}
