//! Encrypted credential vault for Crypto Keeper.
//!
//! Records are encrypted with AES-256-CBC under a master key kept in a local
//! key file. Each record carries its own random IV, and the whole vault is
//! persisted as one JSON document of `category -> identifier -> ciphertext`.

pub mod crypto;
pub mod error;
pub mod keystore;
pub mod legacy;
pub mod shared;
pub mod store;
pub mod types;

pub use error::{Result, VaultError};
pub use keystore::{load_or_create_key, MasterKey};
pub use legacy::{migrate_legacy, MigrationReport};
pub use shared::SharedVault;
pub use store::{VaultStore, VerifyFailure, VerifyReport};
pub use types::{DecryptedRecord, Field, FieldRecord};
