//! Category name -> storage directory mapping, fixed for the life of the process.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, BotConfig};
use crate::error::ConfigError;

use super::OTHER;

/// Directory used when neither the resolved category nor `other` is registered.
pub const FALLBACK_DIR: &str = "./files/misc";

/// A named bucket for files, stored in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub storage_path: PathBuf,
}

/// Registered categories, keyed (and listed) by name.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: BTreeMap<String, Category>,
}

impl CategoryRegistry {
    /// Build from a validated config. Names are unique after `config::load`.
    pub fn from_config(cfg: &BotConfig) -> Self {
        let categories = cfg
            .categories
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    Category {
                        name: c.name.clone(),
                        storage_path: c.path.clone(),
                    },
                )
            })
            .collect();
        Self { categories }
    }

    /// The five built-in categories (document, image, video, audio, other).
    pub fn defaults() -> Self {
        Self::from_config(&BotConfig::default())
    }

    /// Load categories from the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        config::load(path).map(|cfg| Self::from_config(&cfg))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Storage directory of `name`, if registered.
    pub fn resolve_path(&self, name: &str) -> Option<&Path> {
        self.categories.get(name).map(|c| c.storage_path.as_path())
    }

    /// Directory for `name`, else the `other` category's, else [`FALLBACK_DIR`].
    pub fn storage_dir_or_fallback(&self, name: &str) -> PathBuf {
        self.resolve_path(name)
            .or_else(|| self.resolve_path(OTHER))
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR))
    }

    /// Category names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Best-effort creation of every category directory. Failures are logged, not returned.
    /// Returns how many directories exist afterwards.
    pub fn ensure_directories(&self) -> usize {
        let mut ready = 0;
        for cat in self.iter() {
            match fs::create_dir_all(&cat.storage_path) {
                Ok(()) => ready += 1,
                Err(e) => tracing::warn!(
                    category = %cat.name,
                    "error creating directory {}: {}",
                    cat.storage_path.display(),
                    e
                ),
            }
        }
        ready
    }
}
