//! Collaborator ports.
//!
//! The relay bot core is transport-agnostic: MTProto, the bridge database and
//! the Matrix room layer all sit behind these traits, implemented by adapter
//! crates (or by the in-crate [`crate::store::JsonChatStore`] default).

use async_trait::async_trait;

use crate::{
    domain::{ChatEntry, ChatId, MessageId, PeerRef, UserId},
    Result,
};

/// Persistence contract for the chat-membership mirror.
///
/// No transactional guarantees are assumed beyond per-call atomicity.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<ChatEntry>>;
    async fn insert(&self, entry: ChatEntry) -> Result<()>;
    async fn delete_by_id(&self, id: ChatId) -> Result<()>;
}

/// The bot's own user record, as reported by the remote service after login.
#[derive(Clone, Debug)]
pub struct RemoteMe {
    pub id: UserId,
    pub username: String,
}

/// Liveness of a legacy group in a bulk metadata fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    Active,
    Forbidden,
    Left,
    Deactivated,
}

#[derive(Clone, Copy, Debug)]
pub struct ChatMeta {
    pub id: ChatId,
    pub state: ChatState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantRole {
    Creator,
    Admin,
    Member,
}

#[derive(Clone, Copy, Debug)]
pub struct Participant {
    pub user: UserId,
    pub role: ParticipantRole,
}

/// Remote-protocol client port. Transport, auth and request bounding (flood
/// waits, timeouts) are the implementation's concern; a bounded failure
/// surfaces as an error here and the callers fail closed.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn sign_in_bot(&self, token: &str) -> Result<()>;
    async fn get_me(&self) -> Result<RemoteMe>;

    /// Resolve an arbitrary identifier (e.g. a username) to a user id.
    /// `Ok(None)` means it resolved to something other than a user.
    async fn resolve_user(&self, identifier: &str) -> Result<Option<UserId>>;

    /// Bulk-fetch legacy-group metadata by id.
    async fn get_chats(&self, ids: &[ChatId]) -> Result<Vec<ChatMeta>>;

    /// Fetch channel metadata. Lost access surfaces as
    /// [`crate::Error::ChannelPrivate`] or [`crate::Error::ChannelInvalid`].
    async fn check_channel(&self, id: ChatId) -> Result<()>;

    /// Role of a single channel participant; `None` if not a participant.
    async fn channel_participant(
        &self,
        channel: ChatId,
        user: UserId,
    ) -> Result<Option<ParticipantRole>>;

    /// Full participant list of a legacy group.
    async fn chat_participants(&self, chat: ChatId) -> Result<Vec<Participant>>;

    /// Send a text reply into a chat, threaded to the triggering message.
    async fn send_reply(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<()>;
}

/// Bridge-internal user record.
#[derive(Clone, Debug, Default)]
pub struct BridgeUser {
    pub remote_id: Option<UserId>,
    pub matrix_id: String,
    pub is_admin: bool,
    pub relay_whitelisted: bool,
    pub logged_in: bool,
    pub remote_username: Option<String>,
    pub displayname: Option<String>,
}

/// Bridge-internal user store port.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn by_remote_id(&self, id: UserId) -> Result<Option<BridgeUser>>;

    /// Matrix-side lookup. Unknown ids yield a default (non-whitelisted)
    /// record, matching the bridge's lazy user bootstrap.
    async fn by_matrix_id(&self, matrix_id: &str) -> Result<BridgeUser>;
}

/// Snapshot of the portal room for a remote chat.
#[derive(Clone, Debug, Default)]
pub struct PortalInfo {
    pub room_id: Option<String>,
    pub alias: Option<String>,
    pub allow_bridging: bool,
}

/// Portal/room collaborator port.
#[async_trait]
pub trait PortalGateway: Send + Sync {
    async fn portal_info(&self, peer: &PeerRef) -> Result<PortalInfo>;

    /// Create (or fetch) the Matrix room for a chat and return its state.
    async fn create_room(&self, peer: &PeerRef) -> Result<PortalInfo>;

    async fn invite(&self, peer: &PeerRef, matrix_id: &str) -> Result<()>;
}
