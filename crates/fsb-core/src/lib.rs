pub mod config;
pub mod error;
pub mod logging;

pub mod attachment;
pub mod bot;
pub mod category;
pub mod commands;
pub mod credentials;
pub mod filename;
pub mod intake;
pub mod prefs;
pub mod storage;
pub mod telegram;
pub mod transport;
