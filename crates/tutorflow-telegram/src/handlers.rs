//! Update handlers for the Telegram bot.
//!
//! [`route_choice`] and [`route_text`] hold the confirmation logic and only
//! talk to a [`Messenger`]; the `handle_*` functions adapt teloxide updates to
//! them.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::action::{parse_callback_data, Action};
use crate::amount::parse_amount;
use crate::messenger::{Keyboard, MessageRef, Messenger, TelegramMessenger};
use crate::prompts;
use crate::state::{Rejection, SessionStateStore, Transition};

/// A button press, decoded from a callback query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceEvent {
    pub action_tag: String,
    pub subject: String,
    pub chat_id: i64,
    /// The prompt the button was attached to, if Telegram still has it.
    pub message: Option<MessageRef>,
}

/// A plain text message from the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
    pub chat_id: i64,
    pub text: String,
}

/// What happened to a text message.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    /// No amount was expected.
    Ignored,
    /// Not a valid amount; the operator was asked again.
    Reprompted,
    /// The amount settled the lesson.
    Completed(tutorflow_core::SessionResult),
}

/// Edit the prompt in place, or send a fresh one when there is nothing to
/// edit or the edit fails. Returns the fresh prompt, if one was sent.
///
/// A failed edit that the fresh prompt recovers from is only logged; the
/// operator is warned when the fallback fails too.
async fn show<M: Messenger + ?Sized>(
    messenger: &M,
    message: Option<MessageRef>,
    text: &str,
    keyboard: Option<Keyboard>,
) -> Option<MessageRef> {
    if let Some(message) = message {
        match messenger.edit_prompt(message, text, keyboard.clone()).await {
            Ok(()) => return None,
            Err(e) => {
                warn!(message_id = message.message_id, error = %e, "Failed to edit prompt, sending a new one");
            }
        }
    }
    match messenger.send_prompt(text, keyboard).await {
        Ok(fresh) => Some(fresh),
        Err(e) => {
            messenger.report_error("Could not update the prompt", &e).await;
            None
        }
    }
}

/// Apply a button press and update the prompt to match.
pub async fn route_choice<M: Messenger + ?Sized>(
    messenger: &M,
    store: &SessionStateStore,
    event: &ChoiceEvent,
) -> Transition {
    let Some(action) = Action::from_tag(&event.action_tag) else {
        debug!(tag = %event.action_tag, subject = %event.subject, "Unknown action tag");
        return Transition::Rejected(Rejection::UnknownAction(event.action_tag.clone()));
    };

    let subject = event.subject.as_str();
    let transition = store
        .apply(event.chat_id, subject, event.message, action)
        .await;

    match &transition {
        Transition::AskPayment => {
            let fresh = show(
                messenger,
                event.message,
                &prompts::payment_text(subject),
                Some(prompts::payment_keyboard(subject)),
            )
            .await;
            if let Some(fresh) = fresh {
                store.attach_prompt(subject, fresh).await;
            }
        }
        Transition::AskAmount => {
            show(messenger, event.message, &prompts::amount_request_text(subject), None).await;
        }
        Transition::Completed(result) => {
            show(messenger, event.message, &prompts::outcome_text(result), None).await;
            store.release(subject).await;
        }
        Transition::Rejected(_) => {}
    }

    transition
}

/// Treat a text message as the awaited amount, if one is awaited.
pub async fn route_text<M: Messenger + ?Sized>(
    messenger: &M,
    store: &SessionStateStore,
    event: &TextEvent,
) -> TextOutcome {
    if event.text.trim_start().starts_with('/') {
        return TextOutcome::Ignored;
    }

    let Some(subject) = store.awaiting_amount(event.chat_id).await else {
        debug!(chat_id = event.chat_id, "No amount awaited, ignoring text");
        return TextOutcome::Ignored;
    };

    let amount = match parse_amount(&event.text) {
        Ok(amount) => amount,
        Err(e) => {
            info!(subject = %subject, error = %e, "Rejected amount");
            let reprompt = prompts::amount_reprompt_text(&subject, &e.to_string());
            if let Err(e) = messenger.send_text(&reprompt).await {
                messenger.report_error("Could not send the amount prompt", &e).await;
            }
            return TextOutcome::Reprompted;
        }
    };

    let Some(result) = store.complete_amount(event.chat_id, &subject, amount).await else {
        return TextOutcome::Ignored;
    };

    if let Err(e) = messenger.send_text(&prompts::outcome_text(&result)).await {
        messenger.report_error("Could not acknowledge the amount", &e).await;
    }
    store.release(&subject).await;
    TextOutcome::Completed(result)
}

/// Everything the update handlers need.
pub struct HandlerContext {
    pub messenger: Arc<TelegramMessenger>,
    pub store: Arc<SessionStateStore>,
}

impl HandlerContext {
    /// Only the configured operator chat may drive confirmations.
    fn is_operator(&self, chat_id: i64) -> bool {
        self.messenger.chat_id().0 == chat_id
    }
}

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show what this bot does")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Show lessons awaiting confirmation")]
    Status,
}

/// Decode a callback query into a [`ChoiceEvent`].
fn choice_event(q: &CallbackQuery) -> Option<ChoiceEvent> {
    let data = q.data.as_deref()?;
    let (tag, subject) = parse_callback_data(data)?;

    let message = q.message.as_ref().map(|m| MessageRef {
        chat_id: m.chat().id.0,
        message_id: m.id().0,
    });
    let chat_id = message
        .map(|m| m.chat_id)
        .unwrap_or(q.from.id.0 as i64);

    Some(ChoiceEvent {
        action_tag: tag.to_string(),
        subject: subject.to_string(),
        chat_id,
        message,
    })
}

/// Handle an inline button press.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<HandlerContext>,
) -> ResponseResult<()> {
    let Some(event) = choice_event(&q) else {
        debug!(data = ?q.data, "Callback without action|subject data");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    if !ctx.is_operator(event.chat_id) {
        warn!(chat_id = event.chat_id, "Ignoring button press from unknown chat");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    }

    info!(action = %event.action_tag, subject = %event.subject, "Button pressed");
    let transition = route_choice(ctx.messenger.as_ref(), &ctx.store, &event).await;

    let notice = match transition {
        Transition::Rejected(Rejection::AlreadyCompleted) => Some("Already recorded".to_string()),
        Transition::Rejected(Rejection::UnknownSubject) => {
            Some("This lesson is no longer pending".to_string())
        }
        Transition::Rejected(Rejection::AmountPending { subject }) => {
            Some(prompts::amount_pending_text(&subject))
        }
        Transition::Rejected(Rejection::StalePrompt) => {
            Some("This prompt is out of date".to_string())
        }
        _ => None,
    };

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(text) = notice {
        answer = answer.text(text);
    }
    answer.await?;
    Ok(())
}

/// Handle a plain text message.
pub async fn handle_message(
    _bot: Bot,
    msg: Message,
    ctx: Arc<HandlerContext>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if !ctx.is_operator(msg.chat.id.0) {
        warn!(chat_id = %msg.chat.id, "Ignoring message from unknown chat");
        return Ok(());
    }

    let event = TextEvent {
        chat_id: msg.chat.id.0,
        text: text.to_string(),
    };
    let outcome = route_text(ctx.messenger.as_ref(), &ctx.store, &event).await;
    debug!(chat_id = %msg.chat.id, ?outcome, "Text message handled");
    Ok(())
}

/// Handle the /status command.
pub async fn handle_status(
    bot: Bot,
    msg: Message,
    ctx: Arc<HandlerContext>,
) -> ResponseResult<()> {
    let in_flight = ctx.store.in_flight().await;

    let text = if in_flight.is_empty() {
        "No lessons awaiting confirmation.".to_string()
    } else {
        let lines: Vec<String> = in_flight
            .iter()
            .map(|(subject, state)| format!("• <b>{}</b>: {}", prompts::html_escape(subject), state))
            .collect();
        format!("<b>Pending lessons</b>\n\n{}", lines.join("\n"))
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(teloxide::types::ParseMode::Html)
        .await?;
    Ok(())
}

/// Dispatch commands to appropriate handlers.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<HandlerContext>,
) -> ResponseResult<()> {
    if !ctx.is_operator(msg.chat.id.0) {
        warn!(chat_id = %msg.chat.id, "Ignoring command from unknown chat");
        return Ok(());
    }

    match cmd {
        Command::Start => {
            bot.send_message(
                msg.chat.id,
                "👋 I ask you to confirm each finished lesson.\n\n\
                Answer the buttons on each prompt; when asked for an amount, \
                just type it (e.g. 35,50).",
            )
            .await?;
            Ok(())
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
        Command::Status => handle_status(bot, msg, ctx).await,
    }
}
