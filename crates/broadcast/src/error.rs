use crate::channel::ChannelId;

/// Crate-wide result type for broadcast operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A toggle referenced a channel that is not in the configured list.
    #[error("invalid channel: {channel}")]
    InvalidChannel { channel: String },

    /// The channel list must contain at least one destination.
    #[error("channel list is empty")]
    EmptyChannelList,

    #[error("channel {channel} is listed more than once")]
    DuplicateChannel { channel: ChannelId },
}

impl Error {
    #[must_use]
    pub fn invalid_channel(channel: impl std::fmt::Display) -> Self {
        Self::InvalidChannel {
            channel: channel.to_string(),
        }
    }
}
