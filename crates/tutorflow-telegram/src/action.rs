//! Inline button actions and their callback data encoding.
//!
//! Button payloads travel as `"<action>|<subject>"`. Telegram caps callback
//! data at 64 bytes, so subjects are checked before the first prompt is sent.

use crate::error::{Result, TelegramError};

/// Maximum callback data length accepted by Telegram.
pub const CALLBACK_DATA_LIMIT: usize = 64;

const SEPARATOR: char = '|';

/// A button the operator can press while confirming a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The lesson took place.
    ConfirmYes,
    /// The lesson did not take place.
    ConfirmNo,
    /// Paid the standard rate.
    PayStandard,
    /// Not paid.
    PayNone,
    /// Paid an amount the operator will type.
    PayCustom,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::ConfirmYes,
        Action::ConfirmNo,
        Action::PayStandard,
        Action::PayNone,
        Action::PayCustom,
    ];

    /// Wire tag of this action.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ConfirmYes => "confirm_yes",
            Self::ConfirmNo => "confirm_no",
            Self::PayStandard => "pay_std",
            Self::PayNone => "pay_none",
            Self::PayCustom => "pay_custom",
        }
    }

    /// Look up an action by its wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }

    /// Encode the callback data for this action on `subject`.
    pub fn callback_data(&self, subject: &str) -> String {
        format!("{}{}{}", self.tag(), SEPARATOR, subject)
    }
}

/// Split callback data into `(action_tag, subject)`.
///
/// Returns `None` when the separator is missing.
pub fn parse_callback_data(data: &str) -> Option<(&str, &str)> {
    data.split_once(SEPARATOR)
}

/// Check that every button for `subject` fits in Telegram's callback data.
pub fn validate_subject(subject: &str) -> Result<()> {
    let longest = Action::ALL
        .iter()
        .map(|a| a.callback_data(subject).len())
        .max()
        .unwrap_or_default();

    if longest > CALLBACK_DATA_LIMIT {
        return Err(TelegramError::CallbackDataTooLong {
            subject: subject.to_string(),
            len: longest,
            max: CALLBACK_DATA_LIMIT,
        });
    }
    Ok(())
}
