//! Crypto Keeper command-line interface.

pub mod commands;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use keeper_core::config::Config;
use keeper_core::error::ConfigError;
use keeper_core::paths;
use keeper_vault::VaultStore;

/// Crypto Keeper - local encrypted vault for wallet seeds, keys and exchange logins
#[derive(Parser)]
#[command(name = "keeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory holding the key file, data file and config
    #[arg(long, env = paths::HOME_ENV, global = true)]
    pub home: Option<PathBuf>,

    /// Path to config file (defaults to keeper.json5 in the data directory)
    #[arg(short, long, env = "CRYPTO_KEEPER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt and store a record
    Store(commands::records::StoreArgs),

    /// Decrypt and print a record
    Get(commands::records::GetArgs),

    /// Delete a record
    Delete(commands::records::DeleteArgs),

    /// List categories, or the identifiers in one category
    List(commands::records::ListArgs),

    /// Convert a shared-IV data file to per-record IVs
    Migrate,

    /// Run diagnostics on the key file, config and every record
    Doctor,

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Resolved locations and configuration shared by all commands.
pub struct Context {
    /// Data directory.
    pub base_dir: PathBuf,
    /// Config file location (may not exist).
    pub config_path: PathBuf,
    /// Effective configuration.
    pub config: Config,
    /// Why the config file could not be used, for commands that tolerate it.
    pub config_error: Option<ConfigError>,
}

impl Context {
    /// Resolve the data directory and load the config file.
    ///
    /// `config` and `doctor` fall back to defaults on a broken config file so
    /// they can report or repair it; every other command fails.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let base_dir = paths::resolve_base_dir(cli.home.as_deref())
            .context("Failed to determine data directory")?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| paths::config_file(&base_dir));

        let tolerant = matches!(cli.command, Commands::Config(_) | Commands::Doctor);
        let loaded = Config::load_or_default(&config_path).and_then(|config| {
            config.validate(&base_dir)?;
            Ok(config)
        });

        let (config, config_error) = match loaded {
            Ok(config) => (config, None),
            Err(e) if tolerant => (Config::default(), Some(e)),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Invalid config file {}", config_path.display())))
            }
        };

        Ok(Self {
            base_dir,
            config_path,
            config,
            config_error,
        })
    }

    /// Whether the effective configuration came from the config file.
    pub fn config_file_used(&self) -> bool {
        self.config_error.is_none() && self.config_path.exists()
    }

    /// Key file location.
    pub fn key_path(&self) -> PathBuf {
        self.config.key_path(&self.base_dir)
    }

    /// Data file location.
    pub fn data_path(&self) -> PathBuf {
        self.config.data_path(&self.base_dir)
    }

    /// Open the vault, creating the key file on first use.
    pub fn open_vault(&self) -> anyhow::Result<VaultStore> {
        tracing::debug!(
            key = %self.key_path().display(),
            data = %self.data_path().display(),
            "opening vault"
        );
        VaultStore::from_config(&self.base_dir, &self.config).map_err(commands::explain)
    }
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli, ctx: Context) -> anyhow::Result<()> {
    match cli.command {
        Commands::Store(args) => commands::records::store(&ctx, args),
        Commands::Get(args) => commands::records::get(&ctx, args),
        Commands::Delete(args) => commands::records::delete(&ctx, args),
        Commands::List(args) => commands::records::list(&ctx, args),
        Commands::Migrate => commands::migrate::run(&ctx),
        Commands::Doctor => commands::doctor::run(&ctx),
        Commands::Config(args) => commands::config::run(&ctx, args),
        Commands::Version => {
            println!("keeper {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
