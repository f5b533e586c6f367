use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    commands::CommandRouter,
    domain::{
        BotIdentity, ChatKind, MessageEntity, MessageEvent, MessagePayload, PeerRef,
        ServiceAction, Update,
    },
    registry::ChatRegistry,
};

/// Single entry point for inbound protocol updates.
///
/// Classifies each update and feeds membership changes to the registry or
/// command messages to the router. A malformed or partially-resolvable update
/// degrades to a no-op; nothing here may abort the update stream.
pub struct UpdateDispatcher {
    me: BotIdentity,
    registry: Arc<ChatRegistry>,
    router: Arc<CommandRouter>,
}

/// A message is a command invocation iff its first entity is a bot-command
/// marker at the very start of the text.
fn starts_with_command(entities: &[MessageEntity]) -> bool {
    matches!(entities.first(), Some(MessageEntity::BotCommand { offset: 0 }))
}

impl UpdateDispatcher {
    pub fn new(me: BotIdentity, registry: Arc<ChatRegistry>, router: Arc<CommandRouter>) -> Self {
        Self {
            me,
            registry,
            router,
        }
    }

    /// Handle one update. Returns `true` if this bot consumed it; the relay
    /// bot sits early in an update chain and always reports `false` so
    /// downstream handlers still see message updates.
    pub async fn handle(&self, update: &Update) -> bool {
        let msg = match update {
            Update::NewMessage(msg) | Update::NewChannelMessage(msg) => msg,
            Update::Other => return false,
        };

        match &msg.payload {
            MessagePayload::Service(action) => self.handle_service(msg, action).await,
            MessagePayload::Text { entities, .. } => {
                if starts_with_command(entities) {
                    if let Err(e) = self.router.route(msg).await {
                        warn!(chat = msg.peer.chat_id().0, error = %e, "command handling failed");
                    }
                }
            }
        }
        false
    }

    async fn handle_service(&self, msg: &MessageEvent, action: &ServiceAction) {
        let (chat, kind) = match msg.peer {
            PeerRef::Group(id) => (id, ChatKind::Group),
            PeerRef::Channel(id) => (id, ChatKind::Channel),
            // Service messages addressed to a user peer carry no membership
            // information for the registry.
            PeerRef::User(_) => return,
        };

        let result = match action {
            ServiceAction::AddUsers(users) if users.contains(&self.me.remote_id) => {
                debug!(chat = chat.0, kind = ?kind, "added to chat");
                self.registry.add(chat, kind).await
            }
            ServiceAction::DeleteUser(user) if *user == self.me.remote_id => {
                debug!(chat = chat.0, "removed from chat");
                self.registry.remove(chat).await
            }
            ServiceAction::MigrateTo(channel) => {
                debug!(old = chat.0, new = channel.0, "chat migrated to supergroup");
                self.registry.migrate(chat, *channel).await
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            warn!(chat = chat.0, error = %e, "failed to persist membership change");
        }
    }
}
