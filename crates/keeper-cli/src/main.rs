//! Crypto Keeper CLI entry point.

use clap::Parser;
use keeper_cli::{run, Cli, Context};
use keeper_core::config::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Config decides the default log level, so it is resolved before logging starts.
    let ctx = Context::resolve(&cli)?;

    // Initialize logging
    let default_level = match cli.verbose {
        0 => ctx.config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keeper={default_level}")));

    let registry = tracing_subscriber::registry().with(filter);
    match ctx.config.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    match &ctx.config_error {
        Some(e) => tracing::warn!(config = %ctx.config_path.display(), "ignoring config file: {e}"),
        None if ctx.config_file_used() => {
            tracing::debug!(config = %ctx.config_path.display(), "loaded config file")
        }
        None => tracing::debug!(config = %ctx.config_path.display(), "no config file, using defaults"),
    }

    // Run the command
    run(cli, ctx)
}
