use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Config file looked up in the working directory unless `--config` says otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Bot API endpoint used when `[bot] api_url` is not set.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// One `{name, path}` entry of the `categories` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub path: PathBuf,
}

impl CategoryConfig {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: PathBuf::from(path),
        }
    }
}

/// Transport settings (optional `[bot]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
    /// Base URL of the Bot API server (self-hosted servers use a different one).
    pub api_url: String,
    /// Abort a download that stays under 1 KiB/s for this many seconds.
    /// Unset means downloads are only bounded by the connect timeout.
    pub download_stall_secs: Option<u64>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 60,
            api_url: DEFAULT_API_URL.to_string(),
            download_stall_secs: None,
        }
    }
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub bot: BotSettings,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

impl Default for BotConfig {
    /// The five built-in categories under `./files`.
    fn default() -> Self {
        Self {
            bot: BotSettings::default(),
            categories: vec![
                CategoryConfig::new("document", "./files/documents"),
                CategoryConfig::new("image", "./files/images"),
                CategoryConfig::new("video", "./files/videos"),
                CategoryConfig::new("audio", "./files/audio"),
                CategoryConfig::new("other", "./files/misc"),
            ],
        }
    }
}

impl BotConfig {
    /// Category names double as chat commands, so they must be a single token
    /// that cannot be confused with a `/cmd@botname` suffix.
    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories {
                path: path.to_path_buf(),
            });
        }
        let mut seen = HashSet::new();
        for cat in &self.categories {
            let name = cat.name.as_str();
            if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '/' || c == '@') {
                return Err(ConfigError::InvalidCategoryName {
                    name: name.to_string(),
                });
            }
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateCategory {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Parse and validate the config file at `path`.
pub fn load(path: &Path) -> Result<BotConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: BotConfig = toml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate(path)?;
    Ok(cfg)
}

/// Load configuration, falling back to the built-in defaults on any error.
pub fn load_or_default(path: &Path) -> BotConfig {
    match load(path) {
        Ok(cfg) => {
            for cat in &cfg.categories {
                tracing::info!("loaded category: {} -> {}", cat.name, cat.path.display());
            }
            cfg
        }
        Err(e) => {
            tracing::warn!("error loading config: {}. Using default categories.", e);
            BotConfig::default()
        }
    }
}

/// Write the default configuration to `path`. Refuses to overwrite unless `force`.
pub fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let toml = toml::to_string_pretty(&BotConfig::default())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    tracing::info!("wrote default config to {}", path.display());
    Ok(())
}
