//! Text command surface: `/start`, `/help`, `/categories`, `/setdefault`,
//! `/unsetdefault` and `/<category>`.

use crate::category::CategoryRegistry;
use crate::prefs::{UserId, UserPreferences};
use crate::telegram::types::Command;

pub const HELP_TEXT: &str = "Available commands:
/start - Start the bot
/help - Show this help message
/categories - List available file categories
/setdefault [category] - Set default category for saving files
/unsetdefault - Remove default category setting

To save a file with a specific category, send the file with a caption in the format:
/category filename

Example: /image vacation.jpg

If no category is specified, I'll use your default category (if set) or determine it automatically based on file type.";

/// Reply to plain text that is neither a command nor a file.
pub const HINT_TEXT: &str =
    "Please send a file with an optional category in caption. Example: /image vacation.jpg";

const NO_SENDER_TEXT: &str = "Default categories are only available in chats with a sender.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand<'a> {
    Start,
    Help,
    Categories,
    SetDefault(&'a str),
    UnsetDefault,
    /// `/<name>` for a registered category; informational only.
    Category(&'a str),
    Unknown(&'a str),
}

impl<'a> BotCommand<'a> {
    /// Built-in commands take precedence over category names.
    pub fn parse(cmd: &Command<'a>, registry: &CategoryRegistry) -> Self {
        match cmd.name {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "categories" => BotCommand::Categories,
            "setdefault" => BotCommand::SetDefault(cmd.args),
            "unsetdefault" => BotCommand::UnsetDefault,
            name if registry.contains(name) => BotCommand::Category(name),
            name => BotCommand::Unknown(name),
        }
    }
}

/// Sender details a reply may depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sender<'a> {
    pub user_id: Option<UserId>,
    pub first_name: Option<&'a str>,
}

/// Executes `cmd` and returns the reply text. Only `/setdefault` and
/// `/unsetdefault` change state.
pub fn respond(
    cmd: BotCommand<'_>,
    sender: Sender<'_>,
    registry: &CategoryRegistry,
    prefs: &UserPreferences,
) -> String {
    match cmd {
        BotCommand::Start => format!(
            "Welcome, {}! I'm a file saving bot. Send me files and I'll save them for you.\n\nUse /help to see available commands.",
            sender.first_name.unwrap_or("there")
        ),
        BotCommand::Help => HELP_TEXT.to_string(),
        BotCommand::Categories => {
            let mut text = String::from("Available categories for file organization:\n");
            for cat in registry.iter() {
                text.push_str(&format!(
                    "/{} - Save file to {} folder\n",
                    cat.name,
                    cat.storage_path.display()
                ));
            }
            text
        }
        BotCommand::SetDefault("") => {
            "Please specify a category. Usage: /setdefault [category]".to_string()
        }
        BotCommand::SetDefault(name) => {
            let Some(user) = sender.user_id else {
                return NO_SENDER_TEXT.to_string();
            };
            match prefs.set_default(user, name, registry) {
                Ok(()) => format!(
                    "Default category set to '{name}'. All your files will be saved to this category unless specified otherwise."
                ),
                Err(e) => e.to_string(),
            }
        }
        BotCommand::UnsetDefault => {
            let Some(user) = sender.user_id else {
                return NO_SENDER_TEXT.to_string();
            };
            match prefs.clear_default(user) {
                Ok(_) => {
                    "Default category removed. Files will be categorized automatically based on type."
                        .to_string()
                }
                Err(e) => e.to_string(),
            }
        }
        BotCommand::Category(name) => {
            let path = registry
                .resolve_path(name)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            format!(
                "Selected category: {name} (path: {path})\nNow send me a file to save it in this category."
            )
        }
        BotCommand::Unknown(_) => "Unknown command. Type /help for available commands.".to_string(),
    }
}
