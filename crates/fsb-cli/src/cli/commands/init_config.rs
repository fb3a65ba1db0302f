//! `fsb init-config` – write the default config file.

use anyhow::Result;
use fsb_core::config;
use std::path::Path;

pub fn run_init_config(config_path: &Path, force: bool) -> Result<()> {
    config::write_default(config_path, force)?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}
