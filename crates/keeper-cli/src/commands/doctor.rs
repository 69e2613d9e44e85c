//! Diagnostic command.

use console::{style, Emoji};
use keeper_vault::{load_or_create_key, VaultError, VaultStore};

use crate::Context;

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Run the doctor command.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    println!("Crypto Keeper Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    // Check directories
    println!("Checking directories...");
    if ctx.base_dir.exists() {
        println!("  {} Data directory exists: {}", style(CHECK).green(), ctx.base_dir.display());
    } else {
        println!("  {} Data directory missing: {}", style(WARN).yellow(), ctx.base_dir.display());
        warnings += 1;
    }

    // Check config
    println!("\nChecking configuration...");
    match &ctx.config_error {
        None if ctx.config_path.exists() => {
            println!("  {} Configuration valid: {}", style(CHECK).green(), ctx.config_path.display());
        }
        None => {
            println!("  {} No configuration file, using defaults", style(CHECK).green());
        }
        Some(e) => {
            println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    // Check key file. Doctor never creates one.
    println!("\nChecking key file...");
    let key_path = ctx.key_path();
    let data_path = ctx.data_path();
    let key = if key_path.exists() {
        match load_or_create_key(&key_path) {
            Ok(key) => {
                println!(
                    "  {} Key file valid (fingerprint {})",
                    style(CHECK).green(),
                    key.fingerprint()
                );
                check_permissions(&key_path, &mut warnings);
                Some(key)
            }
            Err(e) => {
                println!("  {} {}", style(CROSS).red(), e);
                errors += 1;
                None
            }
        }
    } else if data_path.exists() {
        println!(
            "  {} Key file missing but a data file exists: {}",
            style(CROSS).red(),
            key_path.display()
        );
        println!("    Existing records cannot be decrypted without the original key");
        errors += 1;
        None
    } else {
        println!("  {} No key file yet; one is created on first store", style(WARN).yellow());
        warnings += 1;
        None
    };

    // Check data file
    println!("\nChecking data file...");
    if !data_path.exists() {
        println!("  {} No data file yet", style(WARN).yellow());
        warnings += 1;
    } else if let Some(key) = key {
        check_permissions(&data_path, &mut warnings);
        match VaultStore::with_key(&data_path, key) {
            Ok(vault) => {
                println!("  {} Data file loaded: {} record(s)", style(CHECK).green(), vault.len());
                let report = vault.verify();
                if report.is_clean() {
                    println!("  {} All {} record(s) decrypt", style(CHECK).green(), report.checked);
                } else {
                    for failure in &report.failures {
                        println!(
                            "  {} {}/{}: {}",
                            style(CROSS).red(),
                            failure.category,
                            failure.identifier,
                            failure.error
                        );
                    }
                    errors += report.failures.len();
                }
            }
            Err(VaultError::LegacyLayout { .. }) => {
                println!("  {} Data file uses the legacy shared-IV layout", style(WARN).yellow());
                println!("    Run 'keeper migrate' to convert it");
                warnings += 1;
            }
            Err(e) => {
                println!("  {} {}", style(CROSS).red(), e);
                errors += 1;
            }
        }
    } else {
        println!("  {} Skipped: no usable key", style(WARN).yellow());
    }

    // Summary
    println!();
    if errors == 0 && warnings == 0 {
        println!("{} All checks passed!", style(CHECK).green());
    } else {
        println!("Found {} error(s) and {} warning(s)", errors, warnings);
    }

    if errors > 0 {
        anyhow::bail!("doctor found {} error(s)", errors);
    }
    Ok(())
}

#[cfg(unix)]
fn check_permissions(path: &std::path::Path, warnings: &mut usize) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            println!(
                "  {} {} is accessible by other users (mode {:o})",
                style(WARN).yellow(),
                path.display(),
                mode
            );
            *warnings += 1;
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &std::path::Path, _warnings: &mut usize) {}
