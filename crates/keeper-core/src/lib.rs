//! # keeper-core
//!
//! Core types, configuration, and utilities for Crypto Keeper.
//!
//! - **Configuration**: loading, validation, and saving of `keeper.json5`
//! - **Paths**: resolution of the data directory and the vault files in it
//! - **Secrets**: a zeroize-on-drop string for decrypted values

pub mod config;
pub mod error;
pub mod paths;
pub mod secret;

pub use config::Config;
pub use error::{ConfigError, Result};
pub use secret::SecretString;
