//! Record commands: `keeper store|get|delete|list`.

use clap::Args;
use keeper_vault::types::category;
use keeper_vault::FieldRecord;

use super::explain;
use crate::Context;

/// Store command arguments.
#[derive(Args)]
pub struct StoreArgs {
    /// Category label (e.g. Wallet, Exchange, Others)
    pub category: String,

    /// Identifier, unique within the category
    pub identifier: String,

    /// Plaintext value (if neither this nor --field is given, prompts for hidden input)
    #[arg(long, conflicts_with = "fields")]
    pub value: Option<String>,

    /// Named field as name=value; repeat for several fields
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Replace an existing record without complaining
    #[arg(long)]
    pub force: bool,
}

/// Get command arguments.
#[derive(Args)]
pub struct GetArgs {
    pub category: String,

    pub identifier: String,

    /// Print the record as named fields, one per line
    #[arg(long)]
    pub fields: bool,
}

/// Delete command arguments.
#[derive(Args)]
pub struct DeleteArgs {
    pub category: String,

    pub identifier: String,
}

/// List command arguments.
#[derive(Args)]
pub struct ListArgs {
    /// Show the identifiers in this category instead of all categories
    pub category: Option<String>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("field name must not be empty".to_string());
    }
    Ok((name.to_string(), value.to_string()))
}

/// Run `keeper store`.
pub fn store(ctx: &Context, args: StoreArgs) -> anyhow::Result<()> {
    let mut vault = ctx.open_vault()?;

    if vault.contains(&args.category, &args.identifier) && !args.force {
        anyhow::bail!(
            "Record {}/{} already exists; pass --force to replace it",
            args.category,
            args.identifier
        );
    }

    if !args.fields.is_empty() {
        let mut record = FieldRecord::new();
        for (name, value) in &args.fields {
            record.push(name.as_str(), value.as_str());
        }
        vault
            .store_fields(&args.category, &args.identifier, &record)
            .map_err(explain)?;
    } else {
        let value = match args.value {
            Some(v) => v,
            None => {
                let prompt = format!("Enter value for {}/{}: ", args.category, args.identifier);
                rpassword::prompt_password(prompt)
                    .map_err(|e| anyhow::anyhow!("Failed to read value: {}", e))?
            }
        };

        if value.is_empty() {
            anyhow::bail!("Value must not be empty");
        }

        vault
            .encrypt_and_store(&args.category, &args.identifier, &value)
            .map_err(explain)?;
    }

    println!("Stored {}/{}.", args.category, args.identifier);
    Ok(())
}

/// Run `keeper get`.
pub fn get(ctx: &Context, args: GetArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;

    let Some(record) = vault
        .decrypt_and_retrieve(&args.category, &args.identifier)
        .map_err(explain)?
    else {
        anyhow::bail!("No record found for {}/{}", args.category, args.identifier);
    };

    if args.fields {
        let fields = record.fields().map_err(|e| {
            anyhow::Error::new(e).context("Record was not stored with --field; print it without --fields")
        })?;
        for field in fields.iter() {
            println!("{}: {}", field.name, field.value);
        }
    } else {
        println!("{}", record.expose());
    }

    Ok(())
}

/// Run `keeper delete`.
pub fn delete(ctx: &Context, args: DeleteArgs) -> anyhow::Result<()> {
    let mut vault = ctx.open_vault()?;

    if vault
        .delete(&args.category, &args.identifier)
        .map_err(explain)?
    {
        println!("Deleted {}/{}.", args.category, args.identifier);
        Ok(())
    } else {
        anyhow::bail!("No record found for {}/{}", args.category, args.identifier)
    }
}

/// Run `keeper list`.
pub fn list(ctx: &Context, args: ListArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;

    match args.category {
        Some(category) => {
            let identifiers = vault.identifiers(&category);
            if identifiers.is_empty() {
                println!("No records in {category}.");
            }
            for identifier in identifiers {
                println!("{identifier}");
            }
        }
        None => {
            let mut categories: Vec<&str> = vault.categories();
            for default in category::DEFAULTS {
                if !categories.contains(&default) {
                    categories.push(default);
                }
            }
            categories.sort_unstable();

            println!("{:<24} {}", "CATEGORY", "RECORDS");
            println!("{}", "-".repeat(32));
            for name in &categories {
                println!("{:<24} {}", name, vault.identifiers(name).len());
            }
            println!("\n{} record(s) total.", vault.len());
        }
    }

    Ok(())
}
