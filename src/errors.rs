use crate::domain::ChatId;

/// Core error type for the relay-bot control plane.
///
/// Collaborator implementations should map their failures into this type so
/// the registry can tell loss-of-access apart from transient faults during
/// reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Access to a channel was lost ("channel private" on the wire).
    #[error("channel {0:?} is private")]
    ChannelPrivate(ChatId),

    /// The channel no longer exists or the reference is stale.
    #[error("channel {0:?} is invalid")]
    ChannelInvalid(ChatId),

    #[error("chat store error: {0}")]
    Store(String),

    #[error("client error: {0}")]
    Client(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
