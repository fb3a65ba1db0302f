//! CLI for the FSB file sorting bot.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fsb_core::config::DEFAULT_CONFIG_PATH;
use fsb_core::credentials::DEFAULT_ENV_FILE;
use std::path::PathBuf;

use commands::{run_bot, run_categories, run_init_config};

/// Top-level CLI for the FSB file sorting bot.
#[derive(Debug, Parser)]
#[command(name = "fsb")]
#[command(about = "FSB: chat bot that sorts uploaded files into category folders", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (categories and bot settings).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH, value_name = "PATH")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Connect to the Bot API and process updates until killed.
    Run {
        /// Dotenv-style file checked for TELEGRAM_BOT_TOKEN before the environment.
        #[arg(long, default_value = DEFAULT_ENV_FILE, value_name = "PATH")]
        env_file: PathBuf,
    },

    /// Show the effective categories and their storage directories.
    Categories,

    /// Write the built-in default configuration to the config path.
    InitConfig {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run { env_file } => run_bot(&cli.config, &env_file).await?,
            CliCommand::Categories => run_categories(&cli.config)?,
            CliCommand::InitConfig { force } => run_init_config(&cli.config, force)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
