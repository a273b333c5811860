//! Shared confirmation state for the Telegram bot.
//!
//! The store is the only meeting point between the update handlers, which
//! advance each lesson's state as buttons are pressed and amounts typed, and
//! the orchestrator, which waits for one lesson at a time. Every slot carries
//! an explicit state so out-of-order presses can be rejected, and a one-shot
//! sender that wakes the orchestrator exactly once.
//!
//! Completing a slot does not wake the orchestrator by itself: the router
//! first tells the operator, then calls [`SessionStateStore::release`], so the
//! next lesson's prompt always arrives after the previous acknowledgement.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};
use tutorflow_core::{PaymentStatus, SessionResult};

use crate::action::Action;
use crate::error::{Result, TelegramError};
use crate::messenger::MessageRef;

/// Where a lesson's confirmation stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    /// Waiting for Yes/No.
    AwaitingConfirmation,
    /// Held; waiting for the payment button.
    AwaitingPaymentChoice,
    /// Waiting for the operator to type an amount.
    AwaitingAmountInput,
    /// Finished, not yet collected by the orchestrator.
    Completed(SessionResult),
}

impl SlotState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::AwaitingPaymentChoice => "awaiting payment choice",
            Self::AwaitingAmountInput => "awaiting amount",
            Self::Completed(_) => "completed",
        }
    }
}

/// Why a button press did not change anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The action tag is not one we know.
    UnknownAction(String),
    /// No confirmation is in flight for this subject.
    UnknownSubject,
    /// The slot already holds a result.
    AlreadyCompleted,
    /// The action does not apply to the slot's current state.
    OutOfOrder { state: &'static str },
    /// The button belongs to an older prompt for the same subject.
    StalePrompt,
    /// The chat is still expected to type an amount for another subject.
    AmountPending { subject: String },
}

/// Outcome of applying a button press to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Ask how the lesson was paid.
    AskPayment,
    /// Ask the operator to type the amount.
    AskAmount,
    /// The lesson is settled.
    Completed(SessionResult),
    /// Nothing changed.
    Rejected(Rejection),
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    notify: Option<oneshot::Sender<SessionResult>>,
    /// The prompt whose buttons drive this slot, once sent.
    prompt: Option<MessageRef>,
}

impl Slot {
    /// Callers check the slot is not already completed.
    fn complete(&mut self, result: SessionResult) {
        self.state = SlotState::Completed(result);
    }

    /// Hand the stored result to the waiter. No-op unless completed.
    fn release(&mut self, subject: &str) -> bool {
        let SlotState::Completed(result) = &self.state else {
            return false;
        };
        let Some(tx) = self.notify.take() else {
            return false;
        };
        if tx.send(result.clone()).is_err() {
            debug!(subject = %subject, "Completion receiver already dropped");
        }
        true
    }

    fn is_stale(&self, pressed: Option<MessageRef>) -> bool {
        matches!((self.prompt, pressed), (Some(current), Some(pressed)) if current != pressed)
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// subject -> slot
    slots: HashMap<String, Slot>,
    /// chat_id -> subject whose amount the chat's next message carries
    awaiting_amount: HashMap<i64, String>,
}

impl Inner {
    fn clear_awaiting_for(&mut self, subject: &str) {
        self.awaiting_amount.retain(|_, s| s != subject);
    }
}

/// Per-subject confirmation slots plus the awaited-amount registry.
#[derive(Debug, Default)]
pub struct SessionStateStore {
    inner: Mutex<Inner>,
}

impl SessionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the slot for `subject` and return the receiver that fires once
    /// the completed slot is released.
    pub async fn open_slot(&self, subject: &str) -> Result<oneshot::Receiver<SessionResult>> {
        let mut inner = self.inner.lock().await;
        if inner.slots.contains_key(subject) {
            return Err(TelegramError::SlotExists(subject.to_string()));
        }

        let (tx, rx) = oneshot::channel();
        inner.slots.insert(
            subject.to_string(),
            Slot {
                state: SlotState::AwaitingConfirmation,
                notify: Some(tx),
                prompt: None,
            },
        );
        debug!(subject = %subject, "Opened confirmation slot");
        Ok(rx)
    }

    /// Record the prompt whose buttons now drive `subject`'s slot.
    pub async fn attach_prompt(&self, subject: &str, prompt: MessageRef) {
        if let Some(slot) = self.inner.lock().await.slots.get_mut(subject) {
            slot.prompt = Some(prompt);
        }
    }

    /// Apply a button press from `chat_id` to `subject`'s slot. `pressed` is
    /// the prompt the button was attached to, when Telegram still has it.
    pub async fn apply(
        &self,
        chat_id: i64,
        subject: &str,
        pressed: Option<MessageRef>,
        action: Action,
    ) -> Transition {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let Some(slot) = inner.slots.get_mut(subject) else {
            return Transition::Rejected(Rejection::UnknownSubject);
        };
        if slot.is_stale(pressed) {
            debug!(subject = %subject, action = action.tag(), "Button from an older prompt");
            return Transition::Rejected(Rejection::StalePrompt);
        }

        let transition = match (slot.state.clone(), action) {
            (SlotState::Completed(_), _) => Transition::Rejected(Rejection::AlreadyCompleted),
            (SlotState::AwaitingConfirmation, Action::ConfirmNo) => {
                let result = SessionResult::not_held(subject);
                slot.complete(result.clone());
                Transition::Completed(result)
            }
            (SlotState::AwaitingConfirmation, Action::ConfirmYes) => {
                slot.state = SlotState::AwaitingPaymentChoice;
                Transition::AskPayment
            }
            (SlotState::AwaitingPaymentChoice, Action::PayStandard) => {
                let result = SessionResult::held(subject, PaymentStatus::Standard);
                slot.complete(result.clone());
                Transition::Completed(result)
            }
            (SlotState::AwaitingPaymentChoice, Action::PayNone) => {
                let result = SessionResult::held(subject, PaymentStatus::None);
                slot.complete(result.clone());
                Transition::Completed(result)
            }
            (SlotState::AwaitingPaymentChoice, Action::PayCustom) => {
                match inner.awaiting_amount.get(&chat_id) {
                    Some(other) if other != subject => {
                        return Transition::Rejected(Rejection::AmountPending {
                            subject: other.clone(),
                        });
                    }
                    _ => {}
                }
                slot.state = SlotState::AwaitingAmountInput;
                inner.awaiting_amount.insert(chat_id, subject.to_string());
                Transition::AskAmount
            }
            (state, _) => Transition::Rejected(Rejection::OutOfOrder { state: state.name() }),
        };

        match &transition {
            Transition::Completed(result) => {
                info!(subject = %subject, summary = %result.summary(), "Lesson confirmed");
            }
            Transition::Rejected(reason) => {
                debug!(subject = %subject, action = action.tag(), ?reason, "Ignored button press");
            }
            _ => {
                debug!(subject = %subject, action = action.tag(), "Advanced confirmation");
            }
        }
        transition
    }

    /// Subject whose amount `chat_id` is expected to type next.
    pub async fn awaiting_amount(&self, chat_id: i64) -> Option<String> {
        self.inner.lock().await.awaiting_amount.get(&chat_id).cloned()
    }

    /// Settle `subject` with a typed amount.
    ///
    /// Returns `None` when the chat is no longer awaiting an amount for that
    /// subject (e.g. the slot timed out in the meantime).
    pub async fn complete_amount(
        &self,
        chat_id: i64,
        subject: &str,
        amount: f64,
    ) -> Option<SessionResult> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        if inner.awaiting_amount.get(&chat_id).map(String::as_str) != Some(subject) {
            return None;
        }
        inner.awaiting_amount.remove(&chat_id);

        let slot = inner.slots.get_mut(subject)?;
        if slot.state != SlotState::AwaitingAmountInput {
            warn!(subject = %subject, state = slot.state.name(), "Amount arrived for slot in wrong state");
            return None;
        }

        let result = SessionResult::custom(subject, amount);
        slot.complete(result.clone());
        info!(subject = %subject, amount, "Lesson confirmed with custom amount");
        Some(result)
    }

    /// Wake the orchestrator waiting on `subject`, if its slot is completed.
    pub async fn release(&self, subject: &str) -> bool {
        match self.inner.lock().await.slots.get_mut(subject) {
            Some(slot) => slot.release(subject),
            None => false,
        }
    }

    /// Remove `subject`'s slot, returning its last state.
    pub async fn remove(&self, subject: &str) -> Option<SlotState> {
        let mut inner = self.inner.lock().await;
        inner.clear_awaiting_for(subject);
        let removed = inner.slots.remove(subject).map(|slot| slot.state);
        if removed.is_some() {
            debug!(subject = %subject, "Removed confirmation slot");
        }
        removed
    }

    /// Current state of `subject`'s slot.
    pub async fn state(&self, subject: &str) -> Option<SlotState> {
        self.inner
            .lock()
            .await
            .slots
            .get(subject)
            .map(|slot| slot.state.clone())
    }

    /// Subjects with a slot in flight, with their state names.
    pub async fn in_flight(&self) -> Vec<(String, &'static str)> {
        let inner = self.inner.lock().await;
        let mut list: Vec<_> = inner
            .slots
            .iter()
            .map(|(subject, slot)| (subject.clone(), slot.state.name()))
            .collect();
        list.sort();
        list
    }
}

/// Create a shared store wrapped in Arc for use across handlers.
pub fn create_shared_store() -> Arc<SessionStateStore> {
    Arc::new(SessionStateStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: i64 = 42;

    #[tokio::test]
    async fn test_confirm_no_completes() {
        let store = SessionStateStore::new();
        let rx = store.open_slot("Giovanni").await.unwrap();

        let t = store.apply(CHAT, "Giovanni", None, Action::ConfirmNo).await;
        let expected = SessionResult::not_held("Giovanni");
        assert_eq!(t, Transition::Completed(expected.clone()));

        assert!(store.release("Giovanni").await);
        assert_eq!(rx.await.unwrap(), expected);
        // Only the first release wakes the waiter.
        assert!(!store.release("Giovanni").await);
    }

    #[tokio::test]
    async fn test_completion_waits_for_release() {
        let store = SessionStateStore::new();
        let mut rx = store.open_slot("Giovanni").await.unwrap();
        store.apply(CHAT, "Giovanni", None, Action::ConfirmNo).await;

        assert!(rx.try_recv().is_err());
        store.release("Giovanni").await;
        assert_eq!(rx.try_recv().unwrap(), SessionResult::not_held("Giovanni"));
    }

    #[tokio::test]
    async fn test_release_before_completion_is_noop() {
        let store = SessionStateStore::new();
        let mut rx = store.open_slot("Giovanni").await.unwrap();
        store.apply(CHAT, "Giovanni", None, Action::ConfirmYes).await;

        assert!(!store.release("Giovanni").await);
        assert!(!store.release("Nobody").await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_late_answer_survives_dropped_waiter() {
        let store = SessionStateStore::new();
        let rx = store.open_slot("Giovanni").await.unwrap();
        drop(rx);

        store.apply(CHAT, "Giovanni", None, Action::ConfirmNo).await;
        store.release("Giovanni").await;
        assert_eq!(
            store.remove("Giovanni").await,
            Some(SlotState::Completed(SessionResult::not_held("Giovanni")))
        );
    }

    #[tokio::test]
    async fn test_press_on_older_prompt_rejected() {
        let store = SessionStateStore::new();
        let _rx = store.open_slot("Giovanni").await.unwrap();
        let current = MessageRef {
            chat_id: CHAT,
            message_id: 20,
        };
        let old = MessageRef {
            chat_id: CHAT,
            message_id: 10,
        };
        store.attach_prompt("Giovanni", current).await;

        assert_eq!(
            store.apply(CHAT, "Giovanni", Some(old), Action::ConfirmNo).await,
            Transition::Rejected(Rejection::StalePrompt)
        );
        assert_eq!(
            store.state("Giovanni").await,
            Some(SlotState::AwaitingConfirmation)
        );

        assert_eq!(
            store.apply(CHAT, "Giovanni", Some(current), Action::ConfirmYes).await,
            Transition::AskPayment
        );
        // Presses whose message Telegram no longer has are still accepted.
        assert_eq!(
            store.apply(CHAT, "Giovanni", None, Action::PayNone).await,
            Transition::Completed(SessionResult::held("Giovanni", PaymentStatus::None))
        );
    }

    #[tokio::test]
    async fn test_yes_then_standard() {
        let store = SessionStateStore::new();
        let _rx = store.open_slot("Giovanni").await.unwrap();

        assert_eq!(
            store.apply(CHAT, "Giovanni", None, Action::ConfirmYes).await,
            Transition::AskPayment
        );
        assert_eq!(
            store.state("Giovanni").await,
            Some(SlotState::AwaitingPaymentChoice)
        );

        let t = store.apply(CHAT, "Giovanni", None, Action::PayStandard).await;
        assert_eq!(
            t,
            Transition::Completed(SessionResult::held("Giovanni", PaymentStatus::Standard))
        );
    }

    #[tokio::test]
    async fn test_completed_slot_is_not_overwritten() {
        let store = SessionStateStore::new();
        let _rx = store.open_slot("Giovanni").await.unwrap();
        store.apply(CHAT, "Giovanni", None, Action::ConfirmNo).await;

        assert_eq!(
            store.apply(CHAT, "Giovanni", None, Action::ConfirmNo).await,
            Transition::Rejected(Rejection::AlreadyCompleted)
        );
        assert_eq!(
            store.apply(CHAT, "Giovanni", None, Action::ConfirmYes).await,
            Transition::Rejected(Rejection::AlreadyCompleted)
        );
        assert_eq!(
            store.state("Giovanni").await,
            Some(SlotState::Completed(SessionResult::not_held("Giovanni")))
        );
    }

    #[tokio::test]
    async fn test_out_of_order_actions_rejected() {
        let store = SessionStateStore::new();
        let _rx = store.open_slot("Giovanni").await.unwrap();

        assert_eq!(
            store.apply(CHAT, "Giovanni", None, Action::PayStandard).await,
            Transition::Rejected(Rejection::OutOfOrder {
                state: "awaiting confirmation"
            })
        );

        store.apply(CHAT, "Giovanni", None, Action::ConfirmYes).await;
        assert!(matches!(
            store.apply(CHAT, "Giovanni", None, Action::ConfirmNo).await,
            Transition::Rejected(Rejection::OutOfOrder { .. })
        ));
        assert_eq!(
            store.state("Giovanni").await,
            Some(SlotState::AwaitingPaymentChoice)
        );
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let store = SessionStateStore::new();
        assert_eq!(
            store.apply(CHAT, "Nobody", None, Action::ConfirmYes).await,
            Transition::Rejected(Rejection::UnknownSubject)
        );
    }

    #[tokio::test]
    async fn test_custom_amount_flow() {
        let store = SessionStateStore::new();
        let rx = store.open_slot("Giovanni").await.unwrap();
        store.apply(CHAT, "Giovanni", None, Action::ConfirmYes).await;

        assert_eq!(
            store.apply(CHAT, "Giovanni", None, Action::PayCustom).await,
            Transition::AskAmount
        );
        assert_eq!(store.awaiting_amount(CHAT).await.as_deref(), Some("Giovanni"));
        assert_eq!(store.awaiting_amount(CHAT + 1).await, None);

        let result = store.complete_amount(CHAT, "Giovanni", 40.0).await.unwrap();
        assert_eq!(result, SessionResult::custom("Giovanni", 40.0));
        assert_eq!(store.awaiting_amount(CHAT).await, None);
        store.release("Giovanni").await;
        assert_eq!(rx.await.unwrap().amount, 40.0);

        // A second amount for the same subject changes nothing.
        assert_eq!(store.complete_amount(CHAT, "Giovanni", 99.0).await, None);
    }

    #[tokio::test]
    async fn test_overlapping_custom_amount_rejected() {
        let store = SessionStateStore::new();
        let _a = store.open_slot("A").await.unwrap();
        let _b = store.open_slot("B").await.unwrap();
        store.apply(CHAT, "A", None, Action::ConfirmYes).await;
        store.apply(CHAT, "B", None, Action::ConfirmYes).await;
        store.apply(CHAT, "A", None, Action::PayCustom).await;

        assert_eq!(
            store.apply(CHAT, "B", None, Action::PayCustom).await,
            Transition::Rejected(Rejection::AmountPending {
                subject: "A".to_string()
            })
        );
        assert_eq!(store.awaiting_amount(CHAT).await.as_deref(), Some("A"));
        assert_eq!(store.state("B").await, Some(SlotState::AwaitingPaymentChoice));
    }

    #[tokio::test]
    async fn test_open_slot_twice_fails() {
        let store = SessionStateStore::new();
        let _rx = store.open_slot("A").await.unwrap();
        assert!(matches!(
            store.open_slot("A").await,
            Err(TelegramError::SlotExists(ref s)) if s == "A"
        ));
    }

    #[tokio::test]
    async fn test_remove_clears_awaiting_amount() {
        let store = SessionStateStore::new();
        let _rx = store.open_slot("A").await.unwrap();
        store.apply(CHAT, "A", None, Action::ConfirmYes).await;
        store.apply(CHAT, "A", None, Action::PayCustom).await;

        assert_eq!(store.remove("A").await, Some(SlotState::AwaitingAmountInput));
        assert_eq!(store.awaiting_amount(CHAT).await, None);
        assert_eq!(store.state("A").await, None);
        assert!(store.in_flight().await.is_empty());
    }
}
