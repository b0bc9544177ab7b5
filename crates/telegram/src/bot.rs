use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, Update, UpdateKind},
    },
    tokio::task::JoinHandle,
    tracing::{debug, error, info, warn},
};

use fanout_config::FanoutConfig;

use crate::{handlers, state::BotState};

/// Pause after a failed `getUpdates` before polling again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Extra slack on top of the long-polling timeout for the HTTP client.
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

/// A running polling loop.
pub struct PollingHandle {
    state: Arc<BotState>,
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn state(&self) -> &Arc<BotState> {
        &self.state
    }

    /// Ask the loop to stop; an in-flight update finishes first.
    pub fn cancel(&self) {
        self.state.cancel.cancel();
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "telegram polling task panicked");
        }
    }
}

/// Connect the bot and start polling for updates.
///
/// Spawns a background task that processes updates until the returned
/// handle is cancelled or Telegram reports a conflicting poller.
pub async fn start_polling(config: &FanoutConfig) -> anyhow::Result<PollingHandle> {
    let poll_timeout = config.telegram.poll_timeout_secs;
    // The HTTP client must outlive the long-polling timeout or every idle poll
    // is aborted before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(poll_timeout.into()) + CLIENT_TIMEOUT_SLACK)
        .build()?;
    let bot = Bot::with_client(config.telegram.token.expose_secret(), client);

    // Verify credentials and get bot username.
    let me = bot.get_me().await?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    let commands = vec![BotCommand::new("start", "Show how to broadcast messages")];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    let state = BotState::new(bot, config)?;
    info!(
        username = ?me.username,
        owner_id = state.gate.owner().0,
        channels = state.channels().len(),
        scope = ?state.sessions.scope(),
        concurrency = state.dispatcher.concurrency().get(),
        "telegram bot connected (webhook cleared)"
    );

    Ok(spawn_polling(Arc::new(state), poll_timeout))
}

/// Spawn the polling loop for an already-built state.
pub fn spawn_polling(state: Arc<BotState>, poll_timeout_secs: u32) -> PollingHandle {
    let task = tokio::spawn(run_polling(Arc::clone(&state), poll_timeout_secs));
    PollingHandle { state, task }
}

/// Long-poll `getUpdates` and handle each update in arrival order.
pub async fn run_polling(state: Arc<BotState>, poll_timeout_secs: u32) {
    info!("starting telegram manual polling loop");
    let cancel = state.cancel.clone();
    let mut offset: i32 = 0;

    loop {
        let request = state
            .bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    handle_update(update, &state).await;
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!(
                    "telegram polling stopped: another instance is already running with this token"
                );
                cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_RETRY_DELAY) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
}

/// Route one update to its handler. Handler errors are logged, never fatal.
async fn handle_update(update: Update, state: &BotState) {
    match update.kind {
        UpdateKind::Message(msg) => {
            debug!(chat_id = msg.chat.id.0, "received telegram message");
            if let Err(e) = handlers::handle_message_direct(msg, state).await {
                error!(error = %e, "error handling telegram message");
            }
        },
        UpdateKind::CallbackQuery(query) => {
            debug!(callback_data = ?query.data, "received telegram callback query");
            if let Err(e) = handlers::handle_callback_query(query, state).await {
                error!(error = %e, "error handling telegram callback query");
            }
        },
        other => {
            debug!("ignoring non-message update: {other:?}");
        },
    }
}
