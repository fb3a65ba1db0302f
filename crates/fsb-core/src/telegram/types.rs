//! Bot API wire types. Only the fields the bot reads are modeled.

use serde::Deserialize;

/// Response envelope of every Bot API method.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Audio {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoNote {
    pub file_id: String,
}

/// Result of `getFile`: `file_path` is what the download URL is built from.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Option<Vec<MessageEntity>>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub video: Option<Video>,
    #[serde(default)]
    pub audio: Option<Audio>,
    #[serde(default)]
    pub voice: Option<Voice>,
    #[serde(default)]
    pub video_note: Option<VideoNote>,
}

/// A parsed `/command@bot args` text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    pub args: &'a str,
}

/// Strips a leading `/` and any `@botname` suffix from a command token.
pub fn command_name(token: &str) -> Option<&str> {
    let name = token.strip_prefix('/')?;
    Some(name.split_once('@').map_or(name, |(n, _)| n))
}

impl Message {
    /// True when the message starts with a bot command: the first entity is a
    /// `bot_command` at offset 0, or (without entities) the text starts with `/`.
    pub fn is_command(&self) -> bool {
        let Some(text) = self.text.as_deref() else {
            return false;
        };
        match self.entities.as_deref() {
            Some([first, ..]) => first.kind == "bot_command" && first.offset == 0,
            _ => text.starts_with('/'),
        }
    }

    pub fn command(&self) -> Option<Command<'_>> {
        if !self.is_command() {
            return None;
        }
        let text = self.text.as_deref()?;
        let (token, args) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));
        Some(Command {
            name: command_name(token)?,
            args: args.trim(),
        })
    }

    pub fn user_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }
}
