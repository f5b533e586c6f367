use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric, without the `-100`/`-` prefixes that only
/// appear in Matrix-side command syntax).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Kind of a remote chat, as persisted in the chat store.
///
/// A legacy group ("chat" on the wire) can be upgraded to a supergroup, which
/// is a channel with a brand-new id. The upgrade never mutates an existing
/// entry in place; see [`crate::registry::ChatRegistry::migrate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    User,
    #[serde(rename = "chat")]
    Group,
    Channel,
}

/// One row of the bot's chat-membership mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: ChatId,
    pub kind: ChatKind,
}

/// The relay bot's own identity, resolved once after login and immutable for
/// the lifetime of the session.
#[derive(Clone, Debug)]
pub struct BotIdentity {
    pub remote_id: UserId,
    pub matrix_id: String,
    pub username: String,
}

/// Reference to the peer a message was addressed to or sent by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerRef {
    User(UserId),
    Group(ChatId),
    Channel(ChatId),
}

impl PeerRef {
    /// Raw chat id for registry and reply addressing. A private chat shares
    /// the counterpart user's id.
    pub fn chat_id(&self) -> ChatId {
        match *self {
            PeerRef::User(UserId(id)) => ChatId(id),
            PeerRef::Group(id) | PeerRef::Channel(id) => id,
        }
    }

    pub fn kind(&self) -> ChatKind {
        match self {
            PeerRef::User(_) => ChatKind::User,
            PeerRef::Group(_) => ChatKind::Group,
            PeerRef::Channel(_) => ChatKind::Channel,
        }
    }

    /// Concrete user id, if this peer actually is a user. Group and channel
    /// peers have no single user behind them, so there is nothing to coerce.
    pub fn user_id(&self) -> Option<UserId> {
        match *self {
            PeerRef::User(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, PeerRef::User(_))
    }
}

/// Service-message actions the dispatcher reacts to. Everything else the
/// service can emit collapses into `Other`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceAction {
    AddUsers(Vec<UserId>),
    DeleteUser(UserId),
    MigrateTo(ChatId),
    Other,
}

/// Text entity, reduced to the one distinction that matters here: whether a
/// message opens with a bot-command marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageEntity {
    BotCommand { offset: usize },
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessagePayload {
    Service(ServiceAction),
    Text {
        text: String,
        entities: Vec<MessageEntity>,
    },
}

/// One inbound message, already decoded at the client boundary.
#[derive(Clone, Debug)]
pub struct MessageEvent {
    pub peer: PeerRef,
    pub sender: Option<PeerRef>,
    pub id: MessageId,
    pub payload: MessagePayload,
}

impl MessageEvent {
    /// Total replacement for the wire format's loosely-typed `from_id`: a
    /// message whose sender is not a plain user resolves to `None`, and gated
    /// command paths treat that as a deny.
    pub fn sender_user(&self) -> Option<UserId> {
        self.sender.and_then(|p| p.user_id())
    }
}

/// Inbound protocol updates. Only the two new-message variants are processed;
/// `Other` stands for every update kind this subsystem ignores.
#[derive(Clone, Debug)]
pub enum Update {
    NewMessage(MessageEvent),
    NewChannelMessage(MessageEvent),
    Other,
}
