//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Operator chat not provided.
    #[error("Telegram chat id not set. Set TELEGRAM_CHAT_ID environment variable.")]
    NoChatId,

    /// Operator chat id is not a number.
    #[error("Invalid TELEGRAM_CHAT_ID: {0}")]
    InvalidChatId(String),

    /// Response timeout is not a number of seconds.
    #[error("Invalid response timeout: {0}")]
    InvalidTimeout(String),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Sending or editing a message failed.
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// Subject too long to fit in Telegram callback data.
    #[error("Subject '{subject}' is too long for button data ({len} > {max} bytes)")]
    CallbackDataTooLong {
        subject: String,
        len: usize,
        max: usize,
    },

    /// A confirmation for this subject is already in flight.
    #[error("Confirmation already pending for {0}")]
    SlotExists(String),

    /// Lesson source or result sink error.
    #[error(transparent)]
    Core(#[from] tutorflow_core::CoreError),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<teloxide::RequestError> for TelegramError {
    fn from(e: teloxide::RequestError) -> Self {
        TelegramError::SendFailed(e.to_string())
    }
}
