use color_eyre::Result;
use fott_storage::key_provider::{generate_key, KeyProvider};

use crate::{
    cli::TokenCommand,
    config::{Config, TokenConfig},
    settings,
};

/// Execute a token subcommand. Returns whether the config changed.
pub async fn handle(cmd: TokenCommand, config: &mut Config) -> Result<bool> {
    match cmd {
        TokenCommand::Generate { name, keyring } => {
            let keys = settings::keyring();
            generate(&name, keyring.then_some(&keys), config).await?;
            println!("Created security token {name}");
            Ok(true)
        }
        TokenCommand::List => {
            if config.security_tokens.is_empty() {
                println!("No security tokens yet. Add one with `fott token generate <name>`.");
            }
            for token in &config.security_tokens {
                let source = if token.key.is_some() { "config" } else { "keyring" };
                println!("{} ({source})", token.name);
            }
            Ok(false)
        }
    }
}

/// Add a freshly generated token; with `keys` the key is stored there instead of the config.
pub async fn generate<P: KeyProvider>(
    name: &str,
    keys: Option<&P>,
    config: &mut Config,
) -> Result<()> {
    if config.security_tokens.iter().any(|t| t.name == name) {
        color_eyre::eyre::bail!("security token {name} already exists");
    }
    let key = generate_key();
    let key = match keys {
        Some(keys) => {
            keys.store(name, &key)
                .await
                .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
            None
        }
        None => Some(key),
    };
    config.security_tokens.push(TokenConfig {
        name: name.to_string(),
        key,
    });
    Ok(())
}
