//! Telegram confirmation bot for TutorFlow.
//!
//! For each finished lesson the bot asks the tutor, through inline buttons,
//! whether the lesson took place and how it was paid, and collects the
//! answers in order.
//!
//! # Flow
//!
//! 1. The orchestrator opens a slot for the lesson and sends a Yes/No prompt
//! 2. Button presses advance the slot: No settles it, Yes asks for payment
//! 3. Payment buttons settle it, or "Other amount" waits for a typed number
//! 4. The orchestrator collects the result and moves to the next lesson
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `TELEGRAM_CHAT_ID`: The tutor's chat; other chats are ignored
//!
//! Optional:
//! - `TUTORFLOW_RESPONSE_TIMEOUT_SECS`: Give up on a lesson after this long
//!
//! # Example
//!
//! ```no_run
//! use tutorflow_core::Lesson;
//! use tutorflow_telegram::{BotConfig, ConfirmationBot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::from_env()?;
//!     let bot = ConfirmationBot::new(&config);
//!
//!     let lessons = vec![Lesson::new("Giovanni", "1h 30min")];
//!     let results = bot.run(lessons, None).await?;
//!     println!("{:?}", results);
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - What the bot does
//! - `/help` - Show available commands
//! - `/status` - Lessons awaiting confirmation

pub mod action;
pub mod amount;
pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod messenger;
pub mod orchestrator;
pub mod prompts;
pub mod state;

pub use action::{parse_callback_data, validate_subject, Action, CALLBACK_DATA_LIMIT};
pub use amount::{parse_amount, AmountError};
pub use bot::ConfirmationBot;
pub use config::{parse_timeout_secs, BotConfig};
pub use error::{Result, TelegramError};
pub use handlers::{route_choice, route_text, ChoiceEvent, TextEvent, TextOutcome};
pub use messenger::{Button, Keyboard, MessageRef, Messenger, TelegramMessenger};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use state::{create_shared_store, Rejection, SessionStateStore, SlotState, Transition};
