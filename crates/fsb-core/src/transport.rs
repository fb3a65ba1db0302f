//! Ports between the intake pipeline and the messaging platform.
//!
//! The pipeline only depends on these traits; the Bot API client implements
//! them and tests substitute in-memory fakes.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::TransferError;

/// A message the bot sent, addressable for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Sends and edits chat messages.
pub trait Messenger {
    fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<MessageRef>;
    fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()>;
}

/// Failure while streaming a body into a sink.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u32),
    #[error("{0}")]
    Sink(#[source] io::Error),
}

impl FetchError {
    /// Attach the destination path so sink failures report where the write failed.
    pub fn into_transfer_error(self, path: &Path) -> TransferError {
        match self {
            FetchError::Transport(msg) => TransferError::Fetch(msg),
            FetchError::Status(code) => TransferError::HttpStatus(code),
            FetchError::Sink(source) => TransferError::Write {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Retrieves file bytes by platform source id.
pub trait FileSource {
    /// Resolve a source id to a download URL.
    fn locate(&self, source_id: &str) -> Result<String, TransferError>;
    /// Stream the body at `url` into `sink`, returning the bytes written.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<MessageRef> {
        (**self).send_text(chat_id, text)
    }

    fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()> {
        (**self).edit_text(message, text)
    }
}

impl<T: FileSource + ?Sized> FileSource for Arc<T> {
    fn locate(&self, source_id: &str) -> Result<String, TransferError> {
        (**self).locate(source_id)
    }

    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        (**self).fetch(url, sink)
    }
}
