//! Plaintext-side types.
//!
//! The vault itself only ever sees opaque strings. [`FieldRecord`] is the
//! structured payload callers use when a record has several named parts
//! (seed and private key, exchange login and 2FA secret, ...); it is
//! serialized to JSON before encryption so no delimiter parsing is needed.

use std::fmt;

use keeper_core::SecretString;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// Well-known category labels. The store accepts any category string.
pub mod category {
    pub const WALLET: &str = "Wallet";
    pub const EXCHANGE: &str = "Exchange";
    pub const OTHERS: &str = "Others";

    /// The labels offered by default, in display order.
    pub const DEFAULTS: [&str; 3] = [WALLET, EXCHANGE, OTHERS];
}

/// A decrypted record held in memory.
///
/// Wraps [`SecretString`] so the plaintext is zeroed on drop. Debug and
/// Display both emit `[REDACTED]`.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptedRecord {
    inner: SecretString,
}

impl DecryptedRecord {
    /// Expose the plaintext value. Use sparingly.
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Parse the plaintext as a [`FieldRecord`].
    pub fn fields(&self) -> Result<FieldRecord> {
        FieldRecord::from_plaintext(self.expose())
    }
}

impl From<SecretString> for DecryptedRecord {
    fn from(inner: SecretString) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for DecryptedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for DecryptedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// One named value inside a [`FieldRecord`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// An ordered list of named values stored as a single vault record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct FieldRecord {
    fields: Vec<Field>,
}

impl FieldRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Names may repeat; [`FieldRecord::get`] returns the first.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Builder-style [`FieldRecord::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Iterate over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize to the plaintext handed to the vault.
    pub fn to_plaintext(&self) -> Result<SecretString> {
        serde_json::to_string(self)
            .map(SecretString::new)
            .map_err(|e| VaultError::FieldRecord(e.to_string()))
    }

    /// Parse plaintext written by [`FieldRecord::to_plaintext`].
    pub fn from_plaintext(plaintext: &str) -> Result<Self> {
        // serde_json errors quote at most a position, never the input.
        serde_json::from_str(plaintext).map_err(|e| VaultError::FieldRecord(e.to_string()))
    }
}

impl fmt::Debug for FieldRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|field| field.name.as_str()))
            .finish()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
