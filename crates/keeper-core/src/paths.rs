//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "CRYPTO_KEEPER_HOME";

/// Name of the directory created under the platform data directory.
const APP_DIR_NAME: &str = "crypto-keeper";

/// Default key file name inside the data directory.
pub const DEFAULT_KEY_FILE: &str = "key.txt";

/// Default data file name inside the data directory.
pub const DEFAULT_DATA_FILE: &str = "legacy_data.json";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "keeper.json5";

/// Get the Crypto Keeper data directory.
///
/// Resolution order: `CRYPTO_KEEPER_HOME`, the platform data directory
/// (`~/.local/share/crypto-keeper` on Linux), then `~/.crypto-keeper`.
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(expand_tilde(&home.to_string_lossy()));
    }
    if let Some(data) = dirs::data_dir() {
        return Ok(data.join(APP_DIR_NAME));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(format!(".{APP_DIR_NAME}")))
}

/// Resolve the data directory, preferring an explicit override.
pub fn resolve_base_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(dir) => Ok(expand_tilde(&dir.to_string_lossy())),
        None => base_dir(),
    }
}

/// Get the config file path inside `base`.
pub fn config_file(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Resolve a configured file name against `base`.
///
/// Absolute paths and `~/` paths are used as given; anything else is joined
/// onto the data directory.
pub fn resolve_in(base: &Path, name: &str) -> PathBuf {
    let expanded = expand_tilde(name);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Lexically normalize `path`: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Create `dir` (and parents) with mode `0700` on Unix.
pub fn ensure_private_dir(dir: &Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
