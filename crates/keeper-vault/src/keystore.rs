//! Master key persistence.
//!
//! The master key is 32 random bytes kept as a lowercase hex string in a key
//! file next to the vault data. It is created once, on first run, and never
//! overwritten afterwards: every record in the data file depends on it.

use std::fmt;
use std::io::Write;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, VaultError};

/// Master key length in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// The vault's symmetric key. Zeroed on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Draw a fresh key from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse a hex-encoded key. Surrounding whitespace is ignored.
    pub fn from_hex(encoded: &str) -> std::result::Result<Self, String> {
        let decoded = Zeroizing::new(
            hex::decode(encoded.trim()).map_err(|e| format!("not valid hex: {e}"))?,
        );
        if decoded.len() != KEY_SIZE {
            return Err(format!(
                "must decode to exactly {KEY_SIZE} bytes, got {}",
                decoded.len()
            ));
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }

    /// Lowercase hex form, as written to the key file.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    /// Short non-secret identifier for the key (first 8 bytes of its SHA-256).
    ///
    /// Lets a user confirm two installations share a key without revealing it.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.bytes);
        hex::encode(&digest[..8])
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Load the master key from `path`, creating the file on first run.
///
/// An existing file is never rewritten. Its contents must be exactly 32 bytes
/// of hex; anything else is a [`VaultError::KeyFormat`], since silently using
/// a short or garbled key would make every record undecryptable.
pub fn load_or_create_key(path: &Path) -> Result<MasterKey> {
    match std::fs::read(path) {
        Ok(contents) => {
            debug!(path = %path.display(), "loading master key");
            parse_key_file(path, contents)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => create_key_file(path),
        Err(source) => Err(VaultError::KeyStorage {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_key_file(path: &Path, contents: Vec<u8>) -> Result<MasterKey> {
    let key_format = |reason: String| VaultError::KeyFormat {
        path: path.to_path_buf(),
        reason,
    };

    let text = Zeroizing::new(
        String::from_utf8(contents).map_err(|_| key_format("not valid UTF-8 text".to_string()))?,
    );
    MasterKey::from_hex(&text).map_err(key_format)
}

fn create_key_file(path: &Path) -> Result<MasterKey> {
    let storage = |source: std::io::Error| VaultError::KeyStorage {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        keeper_core::paths::ensure_private_dir(parent).map_err(storage)?;
    }

    let key = MasterKey::generate();

    // NamedTempFile is created with mode 0600 on Unix.
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(storage)?;
    tmp.write_all(key.to_hex().as_bytes()).map_err(storage)?;
    tmp.as_file().sync_all().map_err(storage)?;

    match tmp.persist_noclobber(path) {
        Ok(_) => {
            info!(path = %path.display(), fingerprint = %key.fingerprint(), "created new master key");
            Ok(key)
        }
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            // Someone else created the key first; theirs is authoritative.
            warn!(path = %path.display(), "key file appeared while creating it, loading existing key");
            let contents = std::fs::read(path).map_err(storage)?;
            parse_key_file(path, contents)
        }
        Err(e) => Err(storage(e.error)),
    }
}
