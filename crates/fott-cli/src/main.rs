mod cli;
mod config;
mod projects;
mod settings;
mod tokens;

use std::{path::Path, sync::Arc};

use clap::Parser;
use color_eyre::Result;
use fott_storage::factory::DefaultStorageFactory;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let mut config = config::load_from_path(&path)?;
    debug!(?path, "config loaded");

    let changed = match cli.command {
        Command::Version => {
            print_version();
            false
        }
        Command::Config(ConfigCommand::Init) => {
            init_config(&config, &path)?;
            false
        }
        Command::Token(cmd) => tokens::handle(cmd, &mut config).await?,
        Command::Projects(cmd) => {
            let store = settings::token_store(&config, &settings::keyring()).await?;
            projects::handle(cmd, &mut config, Arc::new(store), DefaultStorageFactory).await?
        }
    };

    if changed {
        config::save_to_path(&config, &path)?;
    }
    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("fott {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config, path: &Path) -> Result<()> {
    let path = config::write_default_if_missing(config, path)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
