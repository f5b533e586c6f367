use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    config::Config,
    domain::{PeerRef, UserId},
    ports::{ParticipantRole, RemoteClient, UserStore},
};

/// Decides whether a remote user may run administrative commands in a chat.
///
/// Two separately-owned id sets back the decision: `configured` comes from
/// static configuration and never changes after construction; `promoted`
/// grows at runtime when the bridge user store reports an admin flag. A
/// configuration reload can therefore never clobber runtime-learned admins.
pub struct PermissionResolver {
    configured: HashSet<UserId>,
    promoted: Mutex<HashSet<UserId>>,
    whitelist_group_admins: bool,
    users: Arc<dyn UserStore>,
    client: Arc<dyn RemoteClient>,
}

impl PermissionResolver {
    /// Resolve the configured whitelist and build the resolver.
    ///
    /// Entries that parse as integers are taken as raw ids; anything else
    /// goes through the client. An unresolvable entry is logged and skipped,
    /// never fatal.
    pub async fn from_config(
        cfg: &Config,
        users: Arc<dyn UserStore>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        let mut configured = HashSet::new();
        for raw in &cfg.whitelist {
            if let Ok(id) = raw.parse::<i64>() {
                configured.insert(UserId(id));
                continue;
            }
            match client.resolve_user(raw).await {
                Ok(Some(id)) => {
                    configured.insert(id);
                }
                Ok(None) => {
                    warn!(entry = raw.as_str(), "whitelist entry is not a user, skipping")
                }
                Err(e) => {
                    warn!(entry = raw.as_str(), error = %e, "failed to resolve whitelist entry")
                }
            }
        }

        Self {
            configured,
            promoted: Mutex::new(HashSet::new()),
            whitelist_group_admins: cfg.whitelist_group_admins,
            users,
            client,
        }
    }

    pub fn is_configured(&self, user: UserId) -> bool {
        self.configured.contains(&user)
    }

    pub async fn is_promoted(&self, user: UserId) -> bool {
        self.promoted.lock().await.contains(&user)
    }

    /// Whether `user` may run administrative commands addressed to `peer`.
    ///
    /// Short-circuits on the two whitelist sets before touching the user
    /// store or the network. The live authority check fails closed: any
    /// collaborator error is a deny, never an error to the caller.
    pub async fn authorize(&self, peer: &PeerRef, user: UserId) -> bool {
        if self.configured.contains(&user) || self.promoted.lock().await.contains(&user) {
            return true;
        }

        match self.users.by_remote_id(user).await {
            Ok(Some(u)) if u.is_admin => {
                self.promoted.lock().await.insert(user);
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(user = user.0, error = %e, "user store lookup failed, denying");
                return false;
            }
        }

        if !self.whitelist_group_admins {
            return false;
        }

        match *peer {
            PeerRef::Channel(channel) => {
                match self.client.channel_participant(channel, user).await {
                    Ok(Some(ParticipantRole::Creator | ParticipantRole::Admin)) => true,
                    Ok(_) => false,
                    Err(e) => {
                        warn!(chat = channel.0, user = user.0, error = %e,
                              "participant lookup failed, denying");
                        false
                    }
                }
            }
            PeerRef::Group(group) => match self.client.chat_participants(group).await {
                Ok(participants) => participants
                    .iter()
                    .find(|p| p.user == user)
                    .map(|p| matches!(p.role, ParticipantRole::Creator | ParticipantRole::Admin))
                    .unwrap_or(false),
                Err(e) => {
                    warn!(chat = group.0, user = user.0, error = %e,
                          "participant list fetch failed, denying");
                    false
                }
            },
            // Administrative commands are never authorized through the
            // group-admin path in a 1:1 chat.
            PeerRef::User(_) => false,
        }
    }
}
