//! In-memory collaborator fakes with call counters, shared by module tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    config::Config,
    domain::{BotIdentity, ChatEntry, ChatId, MessageId, PeerRef, UserId},
    ports::{
        BridgeUser, ChatMeta, ChatState, ChatStore, Participant, ParticipantRole, PortalGateway,
        PortalInfo, RemoteClient, RemoteMe, UserStore,
    },
    Error, Result,
};

pub fn test_config() -> Config {
    Config {
        bot_token: "123456:testtoken".to_string(),
        whitelist: Vec::new(),
        whitelist_group_admins: false,
        authless_portals: false,
        start_message: None,
        matrix_id_template: "@telegram_{}:example.com".to_string(),
        chat_store_path: PathBuf::from("/tmp/relaybot-test-unused.json"),
    }
}

pub fn test_identity() -> BotIdentity {
    BotIdentity {
        remote_id: UserId(100),
        matrix_id: "@telegram_100:example.com".to_string(),
        username: "mybot".to_string(),
    }
}

#[derive(Default)]
pub struct MemStore {
    pub entries: Mutex<Vec<ChatEntry>>,
    pub inserts: AtomicUsize,
    pub deletes: AtomicUsize,
}

#[async_trait]
impl ChatStore for MemStore {
    async fn list_all(&self) -> Result<Vec<ChatEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn insert(&self, entry: ChatEntry) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    async fn delete_by_id(&self, id: ChatId) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }
}

/// How [`FakeClient::check_channel`] treats a channel id.
#[derive(Clone, Copy, Debug)]
pub enum ChannelAccess {
    Private,
    Invalid,
    /// An ambiguous failure (e.g. a flood wait), not a loss of access.
    Flaky,
}

pub struct FakeClient {
    pub me: RemoteMe,
    /// `resolve_user` results by identifier.
    pub resolutions: HashMap<String, UserId>,
    /// Bulk-fetch state overrides; unlisted groups report `Active`.
    pub chat_states: HashMap<i64, ChatState>,
    /// Channel access overrides; unlisted channels check out fine.
    pub channels: HashMap<i64, ChannelAccess>,
    pub channel_roles: HashMap<(i64, i64), ParticipantRole>,
    pub group_participants: HashMap<i64, Vec<Participant>>,
    /// Make every participant lookup fail, for fail-closed tests.
    pub fail_participants: bool,

    pub replies: Mutex<Vec<(ChatId, MessageId, String)>>,
    pub resolve_calls: AtomicUsize,
    pub participant_calls: AtomicUsize,
    pub reply_calls: AtomicUsize,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            me: RemoteMe {
                id: UserId(100),
                username: "mybot".to_string(),
            },
            resolutions: HashMap::new(),
            chat_states: HashMap::new(),
            channels: HashMap::new(),
            channel_roles: HashMap::new(),
            group_participants: HashMap::new(),
            fail_participants: false,
            replies: Mutex::new(Vec::new()),
            resolve_calls: AtomicUsize::new(0),
            participant_calls: AtomicUsize::new(0),
            reply_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RemoteClient for FakeClient {
    async fn sign_in_bot(&self, _token: &str) -> Result<()> {
        Ok(())
    }

    async fn get_me(&self) -> Result<RemoteMe> {
        Ok(self.me.clone())
    }

    async fn resolve_user(&self, identifier: &str) -> Result<Option<UserId>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.resolutions.get(identifier).copied())
    }

    async fn get_chats(&self, ids: &[ChatId]) -> Result<Vec<ChatMeta>> {
        Ok(ids
            .iter()
            .map(|&id| ChatMeta {
                id,
                state: self.chat_states.get(&id.0).copied().unwrap_or(ChatState::Active),
            })
            .collect())
    }

    async fn check_channel(&self, id: ChatId) -> Result<()> {
        match self.channels.get(&id.0) {
            None => Ok(()),
            Some(ChannelAccess::Private) => Err(Error::ChannelPrivate(id)),
            Some(ChannelAccess::Invalid) => Err(Error::ChannelInvalid(id)),
            Some(ChannelAccess::Flaky) => Err(Error::Client("flood wait".to_string())),
        }
    }

    async fn channel_participant(
        &self,
        channel: ChatId,
        user: UserId,
    ) -> Result<Option<ParticipantRole>> {
        self.participant_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_participants {
            return Err(Error::Client("timed out".to_string()));
        }
        Ok(self.channel_roles.get(&(channel.0, user.0)).copied())
    }

    async fn chat_participants(&self, chat: ChatId) -> Result<Vec<Participant>> {
        self.participant_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_participants {
            return Err(Error::Client("timed out".to_string()));
        }
        Ok(self.group_participants.get(&chat.0).cloned().unwrap_or_default())
    }

    async fn send_reply(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<()> {
        self.reply_calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .push((chat, reply_to, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUsers {
    pub by_remote: HashMap<i64, BridgeUser>,
    pub by_matrix: HashMap<String, BridgeUser>,
    pub fail_remote_lookups: bool,
    pub remote_lookups: AtomicUsize,
}

#[async_trait]
impl UserStore for FakeUsers {
    async fn by_remote_id(&self, id: UserId) -> Result<Option<BridgeUser>> {
        self.remote_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_remote_lookups {
            return Err(Error::Store("user store offline".to_string()));
        }
        Ok(self.by_remote.get(&id.0).cloned())
    }

    async fn by_matrix_id(&self, matrix_id: &str) -> Result<BridgeUser> {
        Ok(self.by_matrix.get(matrix_id).cloned().unwrap_or_else(|| BridgeUser {
            matrix_id: matrix_id.to_string(),
            ..BridgeUser::default()
        }))
    }
}

#[derive(Default)]
pub struct FakePortals {
    pub info: PortalInfo,
    pub create_result: PortalInfo,
    pub create_calls: AtomicUsize,
    pub invites: Mutex<Vec<String>>,
}

#[async_trait]
impl PortalGateway for FakePortals {
    async fn portal_info(&self, _peer: &PeerRef) -> Result<PortalInfo> {
        Ok(self.info.clone())
    }

    async fn create_room(&self, _peer: &PeerRef) -> Result<PortalInfo> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.create_result.clone())
    }

    async fn invite(&self, _peer: &PeerRef, matrix_id: &str) -> Result<()> {
        self.invites.lock().unwrap().push(matrix_id.to_string());
        Ok(())
    }
}
