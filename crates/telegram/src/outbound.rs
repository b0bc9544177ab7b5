use std::time::Duration;

use {
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{ChatId, MessageId},
    },
    tracing::debug,
};

use fanout_broadcast::{ChannelId, MessageSender};

/// Reference to a message the operator sent to the bot, enough to copy it
/// elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl From<&Message> for StagedMessage {
    fn from(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id,
            message_id: msg.id,
        }
    }
}

/// Copies staged messages into channels with `copyMessage`.
pub struct TelegramSender {
    bot: Bot,
    timeout: Duration,
}

impl TelegramSender {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }
}

#[async_trait]
impl MessageSender<StagedMessage> for TelegramSender {
    async fn send(&self, message: &StagedMessage, channel: ChannelId) -> anyhow::Result<()> {
        let request = self
            .bot
            .copy_message(ChatId(channel.0), message.chat_id, message.message_id);
        match tokio::time::timeout(self.timeout, async move { request.await }).await {
            Ok(Ok(copied)) => {
                debug!(
                    %channel,
                    source_message_id = message.message_id.0,
                    copied_message_id = copied.0,
                    "copied message to channel"
                );
                Ok(())
            },
            Ok(Err(e)) => Err(e.into()),
            Err(_) => anyhow::bail!("timed out after {}s", self.timeout.as_secs()),
        }
    }
}
