//! Telegram transport for the broadcast bot.
//!
//! Receives updates via teloxide long polling, stages forwarded messages,
//! drives the selection keyboard from callback queries, and copies staged
//! messages to the configured channels.

pub mod access;
pub mod bot;
pub mod error;
pub mod handlers;
pub mod keyboard;
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod mock_api;
pub mod outbound;
pub mod state;

pub use {
    bot::{PollingHandle, run_polling, spawn_polling, start_polling},
    error::{Error, Result},
    outbound::{StagedMessage, TelegramSender},
    state::BotState,
};
