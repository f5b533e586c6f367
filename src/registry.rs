use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    domain::{ChatEntry, ChatId, ChatKind},
    ports::{ChatState, ChatStore, RemoteClient},
    Error, Result,
};

/// In-memory mirror of the chats the relay bot is a member of, backed by a
/// [`ChatStore`].
///
/// The map mutex is held only for the in-memory change; store I/O runs after
/// release, so memory and persisted state are eventually consistent.
pub struct ChatRegistry {
    chats: Mutex<HashMap<ChatId, ChatKind>>,
    store: Arc<dyn ChatStore>,
}

impl ChatRegistry {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            chats: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Replace the in-memory map with the persisted state.
    pub async fn load(&self) -> Result<()> {
        let entries = self.store.list_all().await?;
        let mut chats = self.chats.lock().await;
        chats.clear();
        for entry in entries {
            chats.insert(entry.id, entry.kind);
        }
        Ok(())
    }

    /// Idempotent: a chat that is already tracked is left alone, including
    /// skipping the redundant store write.
    pub async fn add(&self, id: ChatId, kind: ChatKind) -> Result<()> {
        {
            let mut chats = self.chats.lock().await;
            if chats.contains_key(&id) {
                return Ok(());
            }
            chats.insert(id, kind);
        }
        self.store.insert(ChatEntry { id, kind }).await
    }

    /// Idempotent: removing an untracked chat is a successful no-op.
    pub async fn remove(&self, id: ChatId) -> Result<()> {
        let was_tracked = self.chats.lock().await.remove(&id).is_some();
        if was_tracked {
            self.store.delete_by_id(id).await?;
        }
        Ok(())
    }

    pub async fn contains(&self, id: ChatId) -> bool {
        self.chats.lock().await.contains_key(&id)
    }

    /// A legacy group upgrading to a supergroup swaps its numeric identity
    /// entirely. The in-memory replace happens under a single lock
    /// acquisition, so no reader observes both ids (or neither) at once.
    pub async fn migrate(&self, old: ChatId, new: ChatId) -> Result<()> {
        let (removed, inserted) = {
            let mut chats = self.chats.lock().await;
            let removed = chats.remove(&old).is_some();
            let inserted = chats.insert(new, ChatKind::Channel).is_none();
            (removed, inserted)
        };
        if removed {
            self.store.delete_by_id(old).await?;
        }
        if inserted {
            self.store
                .insert(ChatEntry {
                    id: new,
                    kind: ChatKind::Channel,
                })
                .await?;
        }
        Ok(())
    }

    /// Startup pass that drops chats the bot has lost access to.
    ///
    /// Only an explicit loss-of-access signal deregisters a chat; any other
    /// client error propagates, so an outage cannot wipe the registry.
    pub async fn reconcile(&self, client: &dyn RemoteClient) -> Result<()> {
        let snapshot: Vec<ChatEntry> = {
            let chats = self.chats.lock().await;
            chats
                .iter()
                .map(|(&id, &kind)| ChatEntry { id, kind })
                .collect()
        };

        let group_ids: Vec<ChatId> = snapshot
            .iter()
            .filter(|e| e.kind == ChatKind::Group)
            .map(|e| e.id)
            .collect();
        if !group_ids.is_empty() {
            for meta in client.get_chats(&group_ids).await? {
                if meta.state != ChatState::Active {
                    debug!(chat = meta.id.0, state = ?meta.state, "dropping inaccessible group");
                    self.remove(meta.id).await?;
                }
            }
        }

        for entry in snapshot.iter().filter(|e| e.kind == ChatKind::Channel) {
            match client.check_channel(entry.id).await {
                Ok(()) => {}
                Err(Error::ChannelPrivate(_)) | Err(Error::ChannelInvalid(_)) => {
                    debug!(chat = entry.id.0, "dropping inaccessible channel");
                    self.remove(entry.id).await?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
