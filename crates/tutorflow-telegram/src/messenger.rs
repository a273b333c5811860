//! Outbound messaging.
//!
//! The confirmation flow only needs to send a prompt with optional buttons,
//! edit a prompt it sent earlier, and send plain text. [`Messenger`] captures
//! that, so routers and the orchestrator can run against Telegram or an
//! in-memory recorder alike.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use tracing::{debug, warn};

use crate::error::{Result, TelegramError};
use crate::prompts::html_escape;

/// An inline button: label shown to the operator, callback data sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;

/// A message we sent and may edit later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Send and edit messages in the operator's chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a new prompt, returning a reference for later edits.
    async fn send_prompt(&self, text: &str, keyboard: Option<Keyboard>) -> Result<MessageRef>;

    /// Replace the text (and buttons) of a prompt sent earlier.
    async fn edit_prompt(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()>;

    /// Send a plain reply.
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Tell the operator something went wrong. Best effort: a failure here is
    /// only logged.
    async fn report_error(&self, context: &str, error: &TelegramError) {
        warn!(context = %context, error = %error, "Reporting error to operator");
        let text = format!("⚠️ {}: {}", html_escape(context), html_escape(&error.to_string()));
        if let Err(e) = self.send_text(&text).await {
            warn!(error = %e, "Failed to deliver error report");
        }
    }
}

fn to_markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
        row.into_iter()
            .map(|b| InlineKeyboardButton::callback(b.label, b.data))
            .collect::<Vec<_>>()
    }))
}

/// [`Messenger`] bound to the configured operator chat.
#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_prompt(&self, text: &str, keyboard: Option<Keyboard>) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(to_markup(kb));
        }

        let sent = req.await?;
        debug!(chat_id = %self.chat_id, message_id = sent.id.0, "Prompt sent");
        Ok(MessageRef {
            chat_id: sent.chat.id.0,
            message_id: sent.id.0,
        })
    }

    async fn edit_prompt(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        let mut req = self
            .bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(to_markup(kb));
        }

        req.await?;
        debug!(chat_id = message.chat_id, message_id = message.message_id, "Prompt edited");
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_markup_keeps_rows() {
        let kb = vec![
            vec![Button::new("Yes", "confirm_yes|A"), Button::new("No", "confirm_no|A")],
            vec![Button::new("Custom", "pay_custom|A")],
        ];
        let markup = to_markup(kb);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Custom");
    }
}
