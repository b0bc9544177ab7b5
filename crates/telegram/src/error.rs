use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Config(#[from] fanout_config::Error),

    #[error(transparent)]
    Broadcast(#[from] fanout_broadcast::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
