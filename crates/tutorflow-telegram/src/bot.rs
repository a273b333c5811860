//! Telegram bot wiring: dispatcher plus the orchestrator task.

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use tutorflow_core::{Lesson, ResultSink, SessionResult};

use crate::config::BotConfig;
use crate::error::{Result, TelegramError};
use crate::handlers::{handle_callback, handle_command, handle_message, Command, HandlerContext};
use crate::messenger::TelegramMessenger;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::state::{create_shared_store, SessionStateStore};

/// How long to wait before retrying a shutdown request while the dispatcher
/// is still starting up.
const SHUTDOWN_RETRY_MS: u64 = 100;

/// The confirmation bot: asks the operator about each lesson and collects
/// the answers.
pub struct ConfirmationBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Outbound messages to the operator chat.
    messenger: Arc<TelegramMessenger>,
    /// Confirmation state shared by handlers and the orchestrator.
    store: Arc<SessionStateStore>,
    /// Orchestrator settings.
    config: OrchestratorConfig,
}

impl ConfirmationBot {
    /// Create a bot from configuration.
    pub fn new(config: &BotConfig) -> Self {
        let bot = Bot::new(&config.token);
        let messenger = Arc::new(TelegramMessenger::new(bot.clone(), ChatId(config.chat_id)));

        let mut orchestrator_config = OrchestratorConfig::new();
        if let Some(timeout) = config.response_timeout {
            orchestrator_config = orchestrator_config.with_response_timeout(timeout);
        }

        Self {
            bot,
            messenger,
            store: create_shared_store(),
            config: orchestrator_config,
        }
    }

    /// Override the orchestrator settings.
    pub fn with_orchestrator_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Confirm `lessons` with the operator, returning the results in order.
    ///
    /// Runs the update dispatcher until every lesson is settled (or Ctrl+C is
    /// pressed, in which case nothing is returned).
    pub async fn run(
        &self,
        lessons: Vec<Lesson>,
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Result<Vec<SessionResult>> {
        if lessons.is_empty() {
            info!("No lessons to confirm");
            return Ok(Vec::new());
        }

        let ctx = Arc::new(HandlerContext {
            messenger: Arc::clone(&self.messenger),
            store: Arc::clone(&self.store),
        });
        let ctx_for_callbacks = Arc::clone(&ctx);
        let ctx_for_commands = Arc::clone(&ctx);
        let ctx_for_messages = Arc::clone(&ctx);

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query()
                    .endpoint(move |bot: Bot, q: CallbackQuery| {
                        let ctx = Arc::clone(&ctx_for_callbacks);
                        async move { handle_callback(bot, q, ctx).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let ctx = Arc::clone(&ctx_for_commands);
                        debug!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, ctx).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text()
                            .map(|t| !t.starts_with('/'))
                            .unwrap_or(false)
                    })
                    .endpoint(move |bot: Bot, msg: Message| {
                        let ctx = Arc::clone(&ctx_for_messages);
                        async move { handle_message(bot, msg, ctx).await }
                    }),
            );

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build();
        let shutdown = dispatcher.shutdown_token();

        let mut orchestrator = Orchestrator::new(Arc::clone(&self.messenger), Arc::clone(&self.store))
            .with_config(self.config.clone());
        if let Some(sink) = sink {
            orchestrator = orchestrator.with_sink(sink);
        }

        let (results_tx, mut results_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let results = orchestrator.run_lessons(&lessons).await;
            let _ = results_tx.send(results);

            // The dispatcher refuses shutdown until it is running.
            loop {
                match shutdown.shutdown() {
                    Ok(stopped) => {
                        stopped.await;
                        break;
                    }
                    Err(_) => tokio::time::sleep(Duration::from_millis(SHUTDOWN_RETRY_MS)).await,
                }
            }
        });

        info!("Bot is running, waiting for the operator");
        dispatcher.dispatch().await;

        let results = results_rx.try_recv();
        task.abort();

        match results {
            Ok(results) => Ok(results),
            Err(_) => {
                warn!("Stopped before every lesson was confirmed");
                Ok(Vec::new())
            }
        }
    }
}
