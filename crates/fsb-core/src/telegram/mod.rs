//! Telegram Bot API transport: long polling, replies and file downloads.

mod client;
pub mod types;

pub use client::{ApiError, BotApi};
