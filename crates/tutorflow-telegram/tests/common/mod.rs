//! In-memory messenger that records everything sent to the operator.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tutorflow_telegram::{Keyboard, MessageRef, Messenger, Result, TelegramError};

pub const CHAT: i64 = 4242;

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Prompt {
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Text(String),
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    /// Prompts and edits whose text contains this fail to send.
    fail_containing: Option<String>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_containing: Some(needle.to_string()),
            ..Self::default()
        }
    }

    fn check(&self, text: &str) -> Result<()> {
        match &self.fail_containing {
            Some(needle) if text.contains(needle.as_str()) => {
                Err(TelegramError::SendFailed("network unreachable".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<(MessageRef, String)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Prompt { message, text, .. } => Some((message, text)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String, Option<Keyboard>)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Edit {
                    message,
                    text,
                    keyboard,
                } => Some((message, text, keyboard)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` prompts were sent, returning the latest.
    pub async fn wait_for_prompts(&self, count: usize) -> MessageRef {
        for _ in 0..200 {
            let prompts = self.prompts();
            if prompts.len() >= count {
                return prompts[count - 1].0;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} prompts, got {:?}", count, self.sent());
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_prompt(&self, text: &str, keyboard: Option<Keyboard>) -> Result<MessageRef> {
        self.check(text)?;
        let message = MessageRef {
            chat_id: CHAT,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.sent.lock().unwrap().push(Sent::Prompt {
            message,
            text: text.to_string(),
            keyboard,
        });
        Ok(message)
    }

    async fn edit_prompt(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        self.check(text)?;
        self.sent.lock().unwrap().push(Sent::Edit {
            message,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
        Ok(())
    }
}
