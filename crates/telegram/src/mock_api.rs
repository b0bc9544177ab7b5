//! In-process stand-in for the Telegram Bot API used by the transport tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    fanout_broadcast::ChannelId,
    fanout_config::FanoutConfig,
    secrecy::Secret,
    serde_json::{Value, json},
    teloxide::types::{CallbackQuery, Message},
    tokio::sync::oneshot,
};

use crate::state::BotState;

pub const OPERATOR: u64 = 1001;
pub const INTRUDER: u64 = 666;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Lower-cased Bot API method name.
    pub method: String,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct MockTelegramApi {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    failing_chats: Arc<Vec<i64>>,
    pending_updates: Arc<Mutex<VecDeque<Value>>>,
}

impl MockTelegramApi {
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .expect("lock requests")
            .iter()
            .filter(|r| r.method == method)
            .map(|r| r.body.clone())
            .collect()
    }

    /// Queue an update to be returned by the next `getUpdates` call.
    pub fn push_update(&self, update: Value) {
        self.pending_updates
            .lock()
            .expect("lock updates")
            .push_back(update);
    }
}

async fn telegram_api_handler(
    State(state): State<MockTelegramApi>,
    uri: Uri,
    body: Bytes,
) -> Json<Value> {
    let method = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .requests
        .lock()
        .expect("lock requests")
        .push(CapturedRequest {
            method: method.clone(),
            body: body.clone(),
        });

    Json(match method.as_str() {
        "getupdates" => {
            let batch: Vec<Value> = state
                .pending_updates
                .lock()
                .expect("lock updates")
                .drain(..)
                .collect();
            if batch.is_empty() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            json!({ "ok": true, "result": batch })
        },
        "copymessage" => {
            let chat_id = body["chat_id"].as_i64().unwrap_or_default();
            if state.failing_chats.contains(&chat_id) {
                json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: chat not found"
                })
            } else {
                json!({ "ok": true, "result": { "message_id": 500 } })
            }
        },
        "sendmessage" | "editmessagetext" => json!({
            "ok": true,
            "result": {
                "message_id": 77,
                "date": 1,
                "chat": { "id": body["chat_id"], "type": "private", "first_name": "Op" },
                "text": body["text"]
            }
        }),
        _ => json!({ "ok": true, "result": true }),
    })
}

pub struct Harness {
    pub api: MockTelegramApi,
    pub bot: teloxide::Bot,
    pub config: FanoutConfig,
    shutdown: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<()>,
}

impl Harness {
    /// Serve the mock API; `copyMessage` into any of `failing_chats` fails.
    pub async fn start(failing_chats: Vec<i64>) -> Self {
        let api = MockTelegramApi {
            failing_chats: Arc::new(failing_chats),
            ..Default::default()
        };
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        let bot = teloxide::Bot::new("test-token").set_api_url(api_url);

        let mut config = FanoutConfig::default();
        config.telegram.token = Secret::new("test-token".to_string());
        config.telegram.owner_id = OPERATOR;
        config.telegram.poll_timeout_secs = 1;
        config.channels = vec![ChannelId(-1001), ChannelId(-1002), ChannelId(-1003)];

        Self {
            api,
            bot,
            config,
            shutdown,
            server,
        }
    }

    pub fn state(&self) -> BotState {
        BotState::new(self.bot.clone(), &self.config).expect("bot state")
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.server.await.expect("server join");
    }
}

pub fn private_message_json(message_id: i32, from: u64, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "date": 1,
        "chat": { "id": from, "type": "private", "first_name": "Alice" },
        "from": { "id": from, "is_bot": false, "first_name": "Alice" },
        "text": text
    })
}

pub fn private_message(message_id: i32, from: u64, text: &str) -> Message {
    serde_json::from_value(private_message_json(message_id, from, text))
        .expect("deserialize message")
}

/// Button press on the bot's keyboard message in `from`'s private chat.
pub fn callback_json(from: u64, data: &str) -> Value {
    json!({
        "id": format!("cb-{data}"),
        "from": { "id": from, "is_bot": false, "first_name": "Alice" },
        "chat_instance": "instance",
        "data": data,
        "message": {
            "message_id": 77,
            "date": 1,
            "chat": { "id": from, "type": "private", "first_name": "Alice" },
            "text": "keyboard"
        }
    })
}

pub fn callback(from: u64, data: &str) -> CallbackQuery {
    serde_json::from_value(callback_json(from, data)).expect("deserialize callback query")
}
