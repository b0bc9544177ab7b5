use std::{sync::Arc, time::Duration};

use {
    fanout_broadcast::{ChannelList, Dispatcher, MessageSender, SessionStore},
    fanout_config::FanoutConfig,
    tokio_util::sync::CancellationToken,
};

use crate::{
    access::OperatorGate,
    outbound::{StagedMessage, TelegramSender},
};

/// Runtime state of the bot, shared by every handler.
pub struct BotState {
    pub bot: teloxide::Bot,
    pub gate: OperatorGate,
    pub sessions: SessionStore<StagedMessage>,
    pub dispatcher: Dispatcher,
    pub sender: Arc<dyn MessageSender<StagedMessage>>,
    pub cancel: CancellationToken,
}

impl BotState {
    /// Build the state from a validated config, copying through `bot`.
    pub fn new(bot: teloxide::Bot, config: &FanoutConfig) -> crate::Result<Self> {
        let channels = config.channel_list()?;
        let sender = TelegramSender::new(
            bot.clone(),
            Duration::from_secs(config.telegram.send_timeout_secs),
        );
        Ok(Self::with_sender(bot, config, channels, Arc::new(sender)))
    }

    pub fn with_sender(
        bot: teloxide::Bot,
        config: &FanoutConfig,
        channels: ChannelList,
        sender: Arc<dyn MessageSender<StagedMessage>>,
    ) -> Self {
        Self {
            bot,
            gate: OperatorGate::new(config.telegram.owner_id),
            sessions: SessionStore::new(channels, config.session_scope),
            dispatcher: Dispatcher::new(config.dispatch.concurrency()),
            sender,
            cancel: CancellationToken::new(),
        }
    }

    pub fn channels(&self) -> &ChannelList {
        self.sessions.channels()
    }
}
