//! The encrypted record store.
//!
//! [`VaultStore`] keeps every record in memory as
//! `category -> identifier -> base64(iv || ciphertext)` and rewrites the whole
//! data file after each mutation. The file is loaded once at construction;
//! a file that cannot be parsed is reported and left untouched rather than
//! replaced with an empty vault.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use keeper_core::Config;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::crypto;
use crate::error::{Result, VaultError};
use crate::keystore::{self, MasterKey};
use crate::types::{DecryptedRecord, FieldRecord};

/// In-memory vault contents. `BTreeMap` gives a stable key order on disk.
pub(crate) type VaultData = BTreeMap<String, BTreeMap<String, String>>;

/// Top-level key that marks the legacy shared-IV layout.
pub(crate) const LEGACY_IV_KEY: &str = "iv";

/// A file-backed encrypted record store.
pub struct VaultStore {
    data_path: PathBuf,
    key: MasterKey,
    data: VaultData,
}

impl VaultStore {
    /// Open the vault at `data_path`, loading or creating the key at `key_path`.
    ///
    /// A key is only generated for a vault with no records. If the data file
    /// holds records but the key file is gone, this fails with
    /// [`VaultError::MissingKey`] and creates nothing.
    pub fn open(key_path: &Path, data_path: &Path) -> Result<Self> {
        let data = load_vault_file(data_path)?;

        let key_present = key_path.try_exists().map_err(|source| VaultError::KeyStorage {
            path: key_path.to_path_buf(),
            source,
        })?;
        if !key_present && data.values().any(|records| !records.is_empty()) {
            warn!(
                key = %key_path.display(),
                data = %data_path.display(),
                "key file missing for a data file with records"
            );
            return Err(VaultError::MissingKey {
                key_path: key_path.to_path_buf(),
                data_path: data_path.to_path_buf(),
            });
        }

        let key = keystore::load_or_create_key(key_path)?;
        Ok(Self::from_parts(data_path, key, data))
    }

    /// Open the vault described by `config` inside the data directory `base`.
    pub fn from_config(base: &Path, config: &Config) -> Result<Self> {
        Self::open(&config.key_path(base), &config.data_path(base))
    }

    /// Open the vault at `data_path` with an already loaded key.
    pub fn with_key(data_path: &Path, key: MasterKey) -> Result<Self> {
        let data = load_vault_file(data_path)?;
        Ok(Self::from_parts(data_path, key, data))
    }

    fn from_parts(data_path: &Path, key: MasterKey, data: VaultData) -> Self {
        debug!(
            path = %data_path.display(),
            categories = data.len(),
            "opened vault"
        );
        Self {
            data_path: data_path.to_path_buf(),
            key,
            data,
        }
    }

    /// Path of the backing data file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Fingerprint of the master key in use.
    pub fn key_fingerprint(&self) -> String {
        self.key.fingerprint()
    }

    /// Encrypt `plaintext` and store it under `(category, identifier)`.
    ///
    /// An existing record with the same identifier is replaced. The whole
    /// vault is persisted afterwards; on a persistence error the new record
    /// is still held in memory.
    pub fn encrypt_and_store(
        &mut self,
        category: &str,
        identifier: &str,
        plaintext: &str,
    ) -> Result<()> {
        let encoded = crypto::encrypt_record(&self.key, plaintext.as_bytes());

        let replaced = self
            .data
            .entry(category.to_string())
            .or_default()
            .insert(identifier.to_string(), encoded)
            .is_some();
        debug!(category, identifier, replaced, "stored record");

        self.persist()
    }

    /// Serialize `fields` and store them as one record.
    pub fn store_fields(
        &mut self,
        category: &str,
        identifier: &str,
        fields: &FieldRecord,
    ) -> Result<()> {
        let plaintext = fields.to_plaintext()?;
        self.encrypt_and_store(category, identifier, plaintext.expose_secret())
    }

    /// Decrypt the record at `(category, identifier)`.
    ///
    /// Returns `Ok(None)` when there is no such record. Failures to decrypt an
    /// existing record are errors: [`VaultError::Padding`] in particular means
    /// the key file does not match the data or the record was altered.
    pub fn decrypt_and_retrieve(
        &self,
        category: &str,
        identifier: &str,
    ) -> Result<Option<DecryptedRecord>> {
        let Some(encoded) = self.data.get(category).and_then(|c| c.get(identifier)) else {
            return Ok(None);
        };

        let plaintext = crypto::decrypt_record(&self.key, encoded)
            .map_err(|failure| failure.into_vault_error(category, identifier))?;
        debug!(category, identifier, "read record");
        Ok(Some(DecryptedRecord::from(plaintext)))
    }

    /// Decrypt a record and parse it as a [`FieldRecord`].
    pub fn retrieve_fields(&self, category: &str, identifier: &str) -> Result<Option<FieldRecord>> {
        self.decrypt_and_retrieve(category, identifier)?
            .map(|record| record.fields())
            .transpose()
    }

    /// Remove a record. Returns whether anything was removed.
    ///
    /// Nothing is written to disk when the record does not exist. A category
    /// left without records is dropped.
    pub fn delete(&mut self, category: &str, identifier: &str) -> Result<bool> {
        let Some(records) = self.data.get_mut(category) else {
            return Ok(false);
        };
        if records.remove(identifier).is_none() {
            return Ok(false);
        }
        if records.is_empty() {
            self.data.remove(category);
        }

        debug!(category, identifier, "deleted record");
        self.persist()?;
        Ok(true)
    }

    /// Whether a record exists at `(category, identifier)`.
    pub fn contains(&self, category: &str, identifier: &str) -> bool {
        self.data
            .get(category)
            .is_some_and(|c| c.contains_key(identifier))
    }

    /// Categories holding at least one record, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    /// Identifiers stored under `category`, sorted. Empty for unknown categories.
    pub fn identifiers(&self, category: &str) -> Vec<&str> {
        self.data
            .get(category)
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.data.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the full vault to disk, replacing the data file atomically.
    pub fn persist(&self) -> Result<()> {
        write_vault_file(&self.data_path, &self.data)
    }

    /// Try to decrypt every record and collect the ones that fail.
    pub fn verify(&self) -> VerifyReport {
        let mut report = VerifyReport::default();

        for (category, records) in &self.data {
            for (identifier, encoded) in records {
                report.checked += 1;
                if let Err(failure) = crypto::decrypt_record(&self.key, encoded) {
                    let error = failure.into_vault_error(category, identifier);
                    warn!(category = %category, identifier = %identifier, "record failed verification: {error}");
                    report.failures.push(VerifyFailure {
                        category: category.clone(),
                        identifier: identifier.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            checked = report.checked,
            failed = report.failures.len(),
            "vault verification finished"
        );
        report
    }
}

/// Outcome of [`VaultStore::verify`].
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Number of records examined.
    pub checked: usize,
    /// Records that could not be decrypted.
    pub failures: Vec<VerifyFailure>,
}

impl VerifyReport {
    /// True when every record decrypted.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A record that failed [`VaultStore::verify`].
#[derive(Debug)]
pub struct VerifyFailure {
    pub category: String,
    pub identifier: String,
    pub error: VaultError,
}

/// Read and parse the data file. A missing file is an empty vault.
fn load_vault_file(path: &Path) -> Result<VaultData> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no data file yet, starting empty");
            return Ok(VaultData::new());
        }
        Err(e) => {
            return Err(VaultError::Load {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    parse_vault_data(path, &raw)
}

/// Parse data file contents, distinguishing the legacy layout from corruption.
pub(crate) fn parse_vault_data(path: &Path, raw: &[u8]) -> Result<VaultData> {
    let load_error = |reason: String| VaultError::Load {
        path: path.to_path_buf(),
        reason,
    };

    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| load_error(e.to_string()))?;

    if is_legacy_layout(&value) {
        return Err(VaultError::LegacyLayout {
            path: path.to_path_buf(),
        });
    }

    serde_json::from_value(value).map_err(|e| {
        load_error(format!(
            "expected an object of category -> identifier -> ciphertext: {e}"
        ))
    })
}

/// The legacy layout stores its shared IV as a top-level string.
pub(crate) fn is_legacy_layout(value: &serde_json::Value) -> bool {
    value
        .get(LEGACY_IV_KEY)
        .is_some_and(serde_json::Value::is_string)
}

/// Serialize `data` deterministically: sorted keys, 4-space indent, trailing newline.
pub(crate) fn serialize_vault_data(data: &VaultData) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    data.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}

/// Atomically replace the data file with the serialized `data`.
///
/// Writes to a temp file in the same directory, syncs it, then renames over
/// the target, so a crash leaves either the old or the new file.
pub(crate) fn write_vault_file(path: &Path, data: &VaultData) -> Result<()> {
    let persistence = |source: std::io::Error| VaultError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let bytes = serialize_vault_data(data).map_err(|e| persistence(e.into()))?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        keeper_core::paths::ensure_private_dir(parent).map_err(persistence)?;
    }

    // NamedTempFile is created with mode 0600 on Unix.
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(persistence)?;
    tmp.write_all(&bytes).map_err(persistence)?;
    tmp.as_file().sync_all().map_err(persistence)?;
    tmp.persist(path).map_err(|e| persistence(e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "persisted vault");
    Ok(())
}
