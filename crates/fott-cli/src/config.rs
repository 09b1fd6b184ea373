use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use fott_core::project::ProjectReference;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/fott/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Id of the project opened last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_project_id: Option<String>,
    /// Tokens used to seal project connection settings.
    #[serde(default)]
    pub security_tokens: Vec<TokenConfig>,
    /// Recently opened projects, most recent first.
    #[serde(default)]
    pub recent_projects: Vec<ProjectReference>,
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenConfig {
    pub name: String,
    /// Base64 key; when absent the key is read from the OS keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("name", &self.name)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("fott").join("config.toml"))
}

/// Write the config, creating parent directories as needed.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(())
}

/// Write the given config only if no file exists, to avoid clobbering user edits.
pub fn write_default_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        save_to_path(config, path)?;
    }
    Ok(path.to_path_buf())
}
