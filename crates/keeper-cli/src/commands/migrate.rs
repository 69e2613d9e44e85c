//! `keeper migrate`: convert a shared-IV data file to per-record IVs.

use keeper_vault::{load_or_create_key, migrate_legacy};

use super::explain;
use crate::Context;

/// Run the migrate command.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let data_path = ctx.data_path();
    if !data_path.exists() {
        println!("No data file at {}; nothing to migrate.", data_path.display());
        return Ok(());
    }

    // A legacy file is useless without its key, so never generate one here.
    let key_path = ctx.key_path();
    if !key_path.exists() {
        anyhow::bail!(
            "Key file {} not found; the data file cannot be migrated without it",
            key_path.display()
        );
    }
    let key = load_or_create_key(&key_path).map_err(explain)?;

    tracing::info!(fingerprint = %key.fingerprint(), "migrating data file");
    let report = migrate_legacy(&data_path, &key).map_err(explain)?;
    if report.is_noop() {
        println!("{} already uses per-record IVs.", data_path.display());
        return Ok(());
    }

    for (category, count) in &report.migrated {
        println!("  {:<24} {} record(s)", category, count);
    }
    println!("\nMigrated {} record(s).", report.total());
    if let Some(backup) = &report.backup {
        println!("Original file saved as {}", backup.display());
    }
    Ok(())
}
