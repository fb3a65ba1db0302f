//! CLI command handlers. Each command is in its own file.

mod categories;
mod init_config;
mod run;

pub use categories::run_categories;
pub use init_config::run_init_config;
pub use run::run_bot;
