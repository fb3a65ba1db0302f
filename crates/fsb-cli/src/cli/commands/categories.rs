//! `fsb categories` – show the effective category registry.

use anyhow::Result;
use fsb_core::category::CategoryRegistry;
use fsb_core::config;
use std::path::Path;

pub fn run_categories(config_path: &Path) -> Result<()> {
    let cfg = config::load_or_default(config_path);
    let registry = CategoryRegistry::from_config(&cfg);
    println!("{:<16} {}", "NAME", "PATH");
    for cat in registry.iter() {
        println!("{:<16} {}", cat.name, cat.storage_path.display());
    }
    Ok(())
}
