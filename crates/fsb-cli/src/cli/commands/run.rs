//! `fsb run` – connect to the Bot API and process updates sequentially.

use anyhow::{Context, Result};
use fsb_core::bot::Bot;
use fsb_core::category::CategoryRegistry;
use fsb_core::config;
use fsb_core::credentials::{self, TOKEN_VAR};
use fsb_core::prefs::UserPreferences;
use fsb_core::telegram::BotApi;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Pause after a failed `getUpdates` before polling again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

pub async fn run_bot(config_path: &Path, env_file: &Path) -> Result<()> {
    let token = credentials::load_token(env_file, TOKEN_VAR)?;

    let cfg = config::load_or_default(config_path);
    let registry = Arc::new(CategoryRegistry::from_config(&cfg));
    let prefs = Arc::new(UserPreferences::new());

    let poll_timeout = Duration::from_secs(cfg.bot.poll_timeout_secs);
    let stall_timeout = cfg.bot.download_stall_secs.map(Duration::from_secs);
    let api = Arc::new(
        BotApi::new(&cfg.bot.api_url, &token, poll_timeout).with_stall_timeout(stall_timeout),
    );

    let me = {
        let api = Arc::clone(&api);
        tokio::task::spawn_blocking(move || api.get_me())
            .await?
            .context("error creating bot")?
    };
    tracing::info!(
        "authorized on account {}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );
    println!("Authorized on account {}", me.username.as_deref().unwrap_or(&me.first_name));

    let ready = registry.ensure_directories();
    tracing::debug!("{} of {} category directories ready", ready, registry.iter().count());

    let bot = Arc::new(Bot::new(registry, prefs, Arc::clone(&api), Arc::clone(&api)));

    let mut offset = 0i64;
    loop {
        let poll = {
            let api = Arc::clone(&api);
            tokio::task::spawn_blocking(move || api.get_updates(offset)).await?
        };
        let updates = match poll {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("failed to get updates, retrying in {:?}: {}", POLL_RETRY_DELAY, e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        // One update at a time: the next is not touched until this one's report is sent.
        for update in updates {
            offset = offset.max(update.update_id + 1);
            let bot = Arc::clone(&bot);
            let outcome = tokio::task::spawn_blocking(move || bot.handle_update(&update)).await;
            if let Err(e) = outcome {
                tracing::error!("update handler panicked: {}", e);
            }
        }
    }
}
