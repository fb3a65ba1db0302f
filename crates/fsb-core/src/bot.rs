//! Update dispatch: commands, file intake, or a usage hint.

use std::sync::Arc;

use crate::attachment::Attachment;
use crate::category::CategoryRegistry;
use crate::commands::{self, BotCommand, Sender};
use crate::intake::{Intake, IntakeReport};
use crate::prefs::UserPreferences;
use crate::telegram::types::{Message, Update};
use crate::transport::{FileSource, Messenger};

/// What the bot did with one update.
#[derive(Debug)]
pub enum Dispatch {
    /// No message, or a message with nothing to act on.
    Skipped,
    /// A command was answered with this text.
    Command(String),
    File(IntakeReport),
    Hint,
}

/// The bot: shared stores plus the intake pipeline over one transport.
pub struct Bot<S, M> {
    registry: Arc<CategoryRegistry>,
    prefs: Arc<UserPreferences>,
    intake: Intake<S, M>,
}

impl<S: FileSource, M: Messenger> Bot<S, M> {
    pub fn new(
        registry: Arc<CategoryRegistry>,
        prefs: Arc<UserPreferences>,
        source: S,
        messenger: M,
    ) -> Self {
        let intake = Intake::new(Arc::clone(&registry), Arc::clone(&prefs), source, messenger);
        Self {
            registry,
            prefs,
            intake,
        }
    }

    /// Replace the clock used for generated filenames.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.intake = self.intake.with_clock(clock);
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn prefs(&self) -> &UserPreferences {
        &self.prefs
    }

    /// Handle one update to completion.
    pub fn handle_update(&self, update: &Update) -> Dispatch {
        match &update.message {
            Some(msg) => self.handle_message(msg),
            None => Dispatch::Skipped,
        }
    }

    pub fn handle_message(&self, msg: &Message) -> Dispatch {
        if let Some(cmd) = msg.command() {
            let cmd = BotCommand::parse(&cmd, &self.registry);
            tracing::debug!(chat_id = msg.chat.id, ?cmd, "command");
            let sender = Sender {
                user_id: msg.user_id(),
                first_name: msg.from.as_ref().map(|u| u.first_name.as_str()),
            };
            let text = commands::respond(cmd, sender, &self.registry, &self.prefs);
            self.reply(msg.chat.id, &text);
            return Dispatch::Command(text);
        }

        if Attachment::from_message(msg).is_some() {
            return Dispatch::File(self.intake.handle(msg));
        }

        if msg.text.as_deref().is_some_and(|t| !t.is_empty()) {
            self.reply(msg.chat.id, commands::HINT_TEXT);
            return Dispatch::Hint;
        }
        Dispatch::Skipped
    }

    fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.intake.messenger().send_text(chat_id, text) {
            tracing::warn!(chat_id, "could not send reply: {:#}", e);
        }
    }
}
