//! Sequential confirmation of a batch of lessons.
//!
//! One lesson is confirmed at a time: its slot is opened, the Yes/No prompt
//! sent, and the orchestrator suspends on the slot's completion signal before
//! moving to the next lesson. Failures for one lesson never stop the batch.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use tutorflow_core::{Lesson, ResultSink, SessionResult};

use crate::action::validate_subject;
use crate::error::TelegramError;
use crate::messenger::Messenger;
use crate::prompts;
use crate::state::{SessionStateStore, SlotState};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// How long to wait for the operator on each lesson. `None` waits forever.
    pub response_timeout: Option<Duration>,
}

impl OrchestratorConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-lesson response timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }
}

/// Drives the confirmation of lessons one after another.
pub struct Orchestrator<M: Messenger + ?Sized> {
    messenger: Arc<M>,
    store: Arc<SessionStateStore>,
    config: OrchestratorConfig,
    sink: Option<Arc<dyn ResultSink>>,
}

impl<M: Messenger + ?Sized> Orchestrator<M> {
    pub fn new(messenger: Arc<M>, store: Arc<SessionStateStore>) -> Self {
        Self {
            messenger,
            store,
            config: OrchestratorConfig::default(),
            sink: None,
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Hand each result to `sink` as soon as it is collected.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Confirm `subjects` in order, all sharing one duration.
    pub async fn run(&self, subjects: &[String], duration: &str) -> Vec<SessionResult> {
        let lessons: Vec<Lesson> = subjects
            .iter()
            .map(|s| Lesson::new(s.as_str(), duration))
            .collect();
        self.run_lessons(&lessons).await
    }

    /// Confirm `lessons` in order. Lessons whose prompt could not be sent are
    /// left out of the returned list.
    pub async fn run_lessons(&self, lessons: &[Lesson]) -> Vec<SessionResult> {
        info!(count = lessons.len(), "Starting confirmation run");
        let mut results = Vec::with_capacity(lessons.len());

        for lesson in lessons {
            if let Some(result) = self.confirm(lesson).await {
                self.record(&result).await;
                results.push(result);
            }
        }

        info!(confirmed = results.len(), total = lessons.len(), "Confirmation run finished");
        results
    }

    async fn confirm(&self, lesson: &Lesson) -> Option<SessionResult> {
        let subject = lesson.subject.as_str();

        if let Err(e) = validate_subject(subject) {
            self.messenger.report_error("Skipping lesson", &e).await;
            return None;
        }

        let rx = match self.store.open_slot(subject).await {
            Ok(rx) => rx,
            Err(e) => {
                self.messenger.report_error("Skipping lesson", &e).await;
                return None;
            }
        };

        let prompt = match self
            .messenger
            .send_prompt(
                &prompts::confirmation_text(subject, &lesson.duration),
                Some(prompts::confirmation_keyboard(subject)),
            )
            .await
        {
            Ok(prompt) => prompt,
            Err(e) => {
                self.store.remove(subject).await;
                warn!(subject = %subject, error = %e, "Failed to send confirmation prompt");
                self.messenger
                    .report_error(&format!("Could not ask about {}", subject), &e)
                    .await;
                return None;
            }
        };
        self.store.attach_prompt(subject, prompt).await;
        debug!(subject = %subject, message_id = prompt.message_id, "Waiting for operator");

        let received = match self.config.response_timeout {
            None => rx.await.ok(),
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received.ok(),
                Err(_) => {
                    // The operator may have answered just as the timer fired.
                    if let Some(SlotState::Completed(result)) = self.store.remove(subject).await {
                        return Some(result.with_duration(&lesson.duration));
                    }
                    info!(subject = %subject, timeout_secs = limit.as_secs(), "No answer, timing out lesson");
                    if let Err(e) = self
                        .messenger
                        .edit_prompt(prompt, &prompts::timed_out_text(subject), None)
                        .await
                    {
                        warn!(subject = %subject, error = %e, "Failed to mark prompt as timed out");
                        self.messenger
                            .report_error(
                                &format!("Could not mark the lesson with {} as timed out", subject),
                                &e,
                            )
                            .await;
                    }
                    return Some(
                        SessionResult::timed_out(subject).with_duration(&lesson.duration),
                    );
                }
            },
        };

        self.store.remove(subject).await;
        match received {
            Some(result) => Some(result.with_duration(&lesson.duration)),
            None => {
                warn!(subject = %subject, "Slot dropped without a result");
                None
            }
        }
    }

    async fn record(&self, result: &SessionResult) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.record(result) {
            let err = TelegramError::from(e);
            self.messenger
                .report_error(&format!("Could not save the result for {}", result.subject), &err)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.response_timeout, None);
    }

    #[test]
    fn test_config_builder() {
        let config = OrchestratorConfig::new().with_response_timeout(Duration::from_secs(600));
        assert_eq!(config.response_timeout, Some(Duration::from_secs(600)));
    }
}
