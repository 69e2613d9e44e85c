//! Configuration loading and persistence.

use super::Config;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults only when the file is absent.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Write atomically
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ConfigError::Io(e.error))?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // Plain JSON is valid JSON5.
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration for the data directory `base`, collecting
    /// all errors before returning.
    pub fn validate(&self, base: &Path) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let key_empty = self.vault.key_file.trim().is_empty();
        let data_empty = self.vault.data_file.trim().is_empty();
        if key_empty {
            errors.push("vault.key_file must not be empty".to_string());
        }
        if data_empty {
            errors.push("vault.data_file must not be empty".to_string());
        }
        if !key_empty && !data_empty {
            let key_path = paths::normalize(&self.key_path(base));
            if key_path == paths::normalize(&self.data_path(base)) {
                errors.push(format!(
                    "vault.key_file and vault.data_file both point at '{}'",
                    key_path.display()
                ));
            }
        }
        if self.vault.key_file.ends_with('/') || self.vault.data_file.ends_with('/') {
            errors.push("vault file names must not be directories".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Absolute key file path for a given data directory.
    pub fn key_path(&self, base: &Path) -> PathBuf {
        paths::resolve_in(base, &self.vault.key_file)
    }

    /// Absolute data file path for a given data directory.
    pub fn data_path(&self, base: &Path) -> PathBuf {
        paths::resolve_in(base, &self.vault.data_file)
    }
}
