//! Texts and keyboards shown to the operator.

use tutorflow_core::{PaymentStatus, SessionResult};

use crate::action::Action;
use crate::messenger::{Button, Keyboard};

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn button(label: &str, action: Action, subject: &str) -> Button {
    Button::new(label, action.callback_data(subject))
}

/// First prompt for a lesson: did it take place?
pub fn confirmation_text(subject: &str, duration: &str) -> String {
    format!(
        "🎓 <b>Lesson finished!</b>\n\n\
        👤 <b>Student:</b> {}\n\
        ⏳ <b>Duration:</b> {}\n\n\
        Did this lesson take place?",
        html_escape(subject),
        html_escape(duration)
    )
}

pub fn confirmation_keyboard(subject: &str) -> Keyboard {
    vec![vec![
        button("✅ Yes", Action::ConfirmYes, subject),
        button("❌ No", Action::ConfirmNo, subject),
    ]]
}

/// Second prompt: how was it paid?
pub fn payment_text(subject: &str) -> String {
    format!(
        "✅ Lesson with <b>{}</b> confirmed.\n\nHow was it paid?",
        html_escape(subject)
    )
}

pub fn payment_keyboard(subject: &str) -> Keyboard {
    vec![
        vec![
            button("💶 Standard", Action::PayStandard, subject),
            button("🚫 Not paid", Action::PayNone, subject),
        ],
        vec![button("✏️ Other amount", Action::PayCustom, subject)],
    ]
}

pub fn amount_request_text(subject: &str) -> String {
    format!(
        "✏️ Type the amount paid by <b>{}</b> (e.g. <code>35</code> or <code>35,50</code>).",
        html_escape(subject)
    )
}

pub fn amount_reprompt_text(subject: &str, reason: &str) -> String {
    format!(
        "❌ {}.\n\nPlease type the amount for <b>{}</b> as a number, \
        e.g. <code>40</code>, <code>35.50</code> or <code>35,50</code>.",
        html_escape(reason),
        html_escape(subject)
    )
}

/// What the prompt is edited to once the lesson is settled, and the
/// acknowledgement sent after a typed amount.
pub fn outcome_text(result: &SessionResult) -> String {
    let subject = html_escape(&result.subject);
    if !result.held {
        return format!("❌ Lesson with <b>{}</b> marked as not held.", subject);
    }
    match result.payment_status {
        PaymentStatus::Custom => format!(
            "💰 Lesson with <b>{}</b> recorded: paid {:.2}.",
            subject, result.amount
        ),
        PaymentStatus::Standard => {
            format!("💶 Lesson with <b>{}</b> recorded: standard rate.", subject)
        }
        PaymentStatus::None | PaymentStatus::NotApplicable => {
            format!("🚫 Lesson with <b>{}</b> recorded: not paid.", subject)
        }
    }
}

pub fn timed_out_text(subject: &str) -> String {
    format!(
        "⌛ No answer for the lesson with <b>{}</b>; moving on.",
        html_escape(subject)
    )
}

pub fn amount_pending_text(subject: &str) -> String {
    format!("Type the amount for {} first", subject)
}
