/// Config schema types (channels, Telegram bot, dispatch).
use std::num::NonZeroUsize;

use {
    fanout_broadcast::{ChannelId, ChannelList, SessionScope},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Whether each operator gets their own session or all callers share one.
    pub session_scope: SessionScope,
    /// Broadcast destinations, in display order.
    pub channels: Vec<ChannelId>,
    pub telegram: TelegramConfig,
    pub dispatch: DispatchConfig,
}

impl FanoutConfig {
    /// The configured channels as a validated, ordered list.
    pub fn channel_list(&self) -> crate::Result<ChannelList> {
        Ok(ChannelList::new(self.channels.iter().copied())?)
    }
}

/// Telegram bot account configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Telegram user id of the only operator allowed to use the bot.
    pub owner_id: u64,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// Upper bound for a single copy to one channel (seconds).
    pub send_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            owner_id: 0,
            poll_timeout_secs: 30,
            send_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of copies in flight at once (1 = sequential).
    pub concurrency: usize,
}

impl DispatchConfig {
    /// `concurrency` as a non-zero value, clamping 0 up to 1.
    pub fn concurrency(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.concurrency).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = FanoutConfig::default();
        assert_eq!(cfg.session_scope, SessionScope::PerOperator);
        assert!(cfg.channels.is_empty());
        assert_eq!(cfg.telegram.poll_timeout_secs, 30);
        assert_eq!(cfg.telegram.send_timeout_secs, 30);
        assert_eq!(cfg.dispatch.concurrency().get(), 1);
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            session_scope = "shared"
            channels = [-1002504723776, -1002489624380]

            [telegram]
            token = "123:ABC"
            owner_id = 42

            [dispatch]
            concurrency = 4
        "#;
        let cfg: FanoutConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.session_scope, SessionScope::Shared);
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.telegram.owner_id, 42);
        assert_eq!(cfg.dispatch.concurrency().get(), 4);
        // defaults for unspecified fields
        assert_eq!(cfg.telegram.send_timeout_secs, 30);

        let channels = cfg.channel_list().unwrap();
        assert_eq!(channels.by_position(2), Some(ChannelId(-1002489624380)));
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("123:very-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn zero_concurrency_clamps_to_one() {
        let cfg = DispatchConfig { concurrency: 0 };
        assert_eq!(cfg.concurrency().get(), 1);
    }
}
