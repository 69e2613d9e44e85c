//! A cloneable, thread-safe handle to one [`VaultStore`].
//!
//! `VaultStore` persists after every mutation, which is only safe with a
//! single writer. `SharedVault` serializes all access through one mutex that
//! is held until the write to disk has finished.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::store::{VaultStore, VerifyReport};
use crate::types::{DecryptedRecord, FieldRecord};

/// Shared single-writer access to a vault.
#[derive(Clone)]
pub struct SharedVault {
    inner: Arc<Mutex<VaultStore>>,
}

impl SharedVault {
    pub fn new(store: VaultStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// See [`VaultStore::encrypt_and_store`].
    pub fn store(&self, category: &str, identifier: &str, plaintext: &str) -> Result<()> {
        self.inner
            .lock()
            .encrypt_and_store(category, identifier, plaintext)
    }

    /// See [`VaultStore::store_fields`].
    pub fn store_fields(&self, category: &str, identifier: &str, fields: &FieldRecord) -> Result<()> {
        self.inner.lock().store_fields(category, identifier, fields)
    }

    /// See [`VaultStore::decrypt_and_retrieve`].
    pub fn retrieve(&self, category: &str, identifier: &str) -> Result<Option<DecryptedRecord>> {
        self.inner.lock().decrypt_and_retrieve(category, identifier)
    }

    /// See [`VaultStore::delete`].
    pub fn delete(&self, category: &str, identifier: &str) -> Result<bool> {
        self.inner.lock().delete(category, identifier)
    }

    pub fn contains(&self, category: &str, identifier: &str) -> bool {
        self.inner.lock().contains(category, identifier)
    }

    pub fn categories(&self) -> Vec<String> {
        self.inner
            .lock()
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn identifiers(&self, category: &str) -> Vec<String> {
        self.inner
            .lock()
            .identifiers(category)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn verify(&self) -> VerifyReport {
        self.inner.lock().verify()
    }

    /// Run `f` with exclusive access, e.g. to check-then-store atomically.
    pub fn with<R>(&self, f: impl FnOnce(&mut VaultStore) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
