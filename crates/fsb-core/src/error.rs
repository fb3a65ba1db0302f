//! Error taxonomy shared by the intake pipeline and its callers.
//!
//! Only `CredentialError` is fatal. Everything else is either recovered
//! locally (`ConfigError`) or rendered to the user as a reply.

use std::io;
use std::path::PathBuf;

/// Bad or missing configuration. Callers recover with the built-in categories.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} defines no categories", path.display())]
    NoCategories { path: PathBuf },

    #[error("invalid category name '{name}' (must be non-empty, without whitespace, '/' or '@')")]
    InvalidCategoryName { name: String },

    #[error("category '{name}' is defined more than once")]
    DuplicateCategory { name: String },
}

/// Bot token could not be found in the dotenv file or the environment.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{var} not found in {} or environment variables", env_file.display())]
    Missing { var: String, env_file: PathBuf },
}

/// Rejected user preference change. No state is modified when returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreferenceError {
    #[error("Category '{name}' does not exist. Available categories: {}", available.join(", "))]
    UnknownCategory { name: String, available: Vec<String> },

    #[error("You don't have a default category set.")]
    NoDefaultSet,
}

/// Failure while fetching and storing one file. Terminal for that message.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("error getting file URL: {0}")]
    FileUrl(String),

    #[error("error creating directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error creating file {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error downloading file: {0}")]
    Fetch(String),

    #[error("error downloading file: HTTP {0}")]
    HttpStatus(u32),

    #[error("error writing file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error finalizing file {}: {source}", path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
