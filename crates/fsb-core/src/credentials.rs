//! Bot token lookup: dotenv-style file first, then the process environment.

use std::fs;
use std::path::Path;

use crate::error::CredentialError;

/// Variable holding the bot token, in the dotenv file and in the environment.
pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Dotenv file looked up in the working directory unless `--env-file` says otherwise.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Returns the value of `key` from a dotenv-style file.
///
/// Lines are `KEY=value`; blank lines and `#` comments are skipped and
/// surrounding quotes are stripped. A missing or unreadable file yields `None`.
pub fn read_env_file(path: &Path, key: &str) -> Option<String> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("error reading {}: {}", path.display(), e);
            return None;
        }
    };
    parse_env_value(&data, key)
}

fn parse_env_value(data: &str, key: &str) -> Option<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
}

/// Loads the bot token from `env_file`, falling back to the `var` environment variable.
/// Empty values count as absent.
pub fn load_token(env_file: &Path, var: &str) -> Result<String, CredentialError> {
    read_env_file(env_file, var)
        .filter(|t| !t.is_empty())
        .or_else(|| std::env::var(var).ok().filter(|t| !t.is_empty()))
        .ok_or_else(|| CredentialError::Missing {
            var: var.to_string(),
            env_file: env_file.to_path_buf(),
        })
}
