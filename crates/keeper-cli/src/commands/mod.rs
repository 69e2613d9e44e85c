//! CLI command implementations.

pub mod config;
pub mod doctor;
pub mod migrate;
pub mod records;

use keeper_vault::VaultError;

/// Turn a vault error into a user-facing message that says what to do next.
pub fn explain(err: VaultError) -> anyhow::Error {
    let hint = match &err {
        VaultError::Padding { .. } | VaultError::Encoding { .. } => Some(
            "The key file does not match this record, or the record was modified. \
             Make sure key.txt is the one that was used with this data file.",
        ),
        VaultError::CorruptRecord { .. } => {
            Some("The stored value is damaged; restore the data file from a backup.")
        }
        VaultError::KeyFormat { .. } => Some(
            "The key file must contain exactly 64 hex characters. Restore it from a backup; \
             generating a new key would make existing records unreadable.",
        ),
        VaultError::MissingKey { .. } => Some(
            "Restore the key file from a backup. No new key was generated, since it could \
             not decrypt the existing records.",
        ),
        VaultError::LegacyLayout { .. } => Some("Run 'keeper migrate' to convert it."),
        VaultError::Load { .. } => {
            Some("The data file was left untouched. Fix or restore it before storing new records.")
        }
        VaultError::Persistence { .. } => {
            Some("The change was not saved. Check free space and permissions, then retry.")
        }
        _ => None,
    };

    match hint {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => anyhow::Error::new(err),
    }
}
