//! Configuration management commands.

use clap::Args;
use keeper_core::config::Config;

use crate::Context;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show configuration file path and the resolved vault files
    Path,

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub fn run(ctx: &Context, args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            if let Some(e) = &ctx.config_error {
                eprintln!("warning: {e}; showing defaults");
            }
            let json = serde_json::to_string_pretty(&ctx.config)?;
            println!("{}", json);
        }

        ConfigCommand::Path => {
            println!("config:    {}", ctx.config_path.display());
            println!("key file:  {}", ctx.key_path().display());
            println!("data file: {}", ctx.data_path().display());
        }

        ConfigCommand::Init { force } => {
            if ctx.config_path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    ctx.config_path.display()
                );
            }
            Config::default().save(&ctx.config_path)?;
            println!("Wrote default configuration to {}", ctx.config_path.display());
        }

        ConfigCommand::Validate => match &ctx.config_error {
            Some(e) => anyhow::bail!("Configuration invalid: {}", e),
            None => println!("Configuration valid."),
        },
    }

    Ok(())
}
