use std::sync::Arc;

use crate::{
    config::Config,
    domain::{BotIdentity, MessageEvent, MessagePayload, PeerRef},
    permissions::PermissionResolver,
    ports::{PortalGateway, RemoteClient, UserStore},
    Result,
};

const NO_PERMISSION: &str = "You do not have the permission to use that command.";

/// Parses inbound command text and runs the recognized command.
///
/// Gated commands (`/portal`, `/invite`) go through the permission resolver
/// and are silently ignored in private chats; unknown commands produce no
/// reply at all.
pub struct CommandRouter {
    cfg: Arc<Config>,
    me: BotIdentity,
    client: Arc<dyn RemoteClient>,
    users: Arc<dyn UserStore>,
    portals: Arc<dyn PortalGateway>,
    permissions: Arc<PermissionResolver>,
}

/// `text` invokes `command` iff its first token is `/command` or
/// `/command@bot_username`, compared case-insensitively on the token.
/// `/commandish` must not match, so the token has to end at the string end
/// or at a space.
pub fn match_command(text: &str, command: &str, bot_username: &str) -> bool {
    let text = text.to_lowercase();
    let plain = format!("/{}", command.to_lowercase());
    let targeted = format!("{plain}@{}", bot_username.to_lowercase());

    if text == plain || text == targeted {
        return true;
    }
    text.starts_with(&format!("{plain} ")) || text.starts_with(&format!("{targeted} "))
}

/// A plausible Matrix user id: `@` sigil, then a `:` domain separator past
/// the second character.
fn looks_like_matrix_id(s: &str) -> bool {
    s.starts_with('@') && s.find(':').map(|i| i >= 2).unwrap_or(false)
}

impl CommandRouter {
    pub fn new(
        cfg: Arc<Config>,
        me: BotIdentity,
        client: Arc<dyn RemoteClient>,
        users: Arc<dyn UserStore>,
        portals: Arc<dyn PortalGateway>,
        permissions: Arc<PermissionResolver>,
    ) -> Self {
        Self {
            cfg,
            me,
            client,
            users,
            portals,
            permissions,
        }
    }

    async fn reply(&self, msg: &MessageEvent, text: &str) -> Result<()> {
        self.client.send_reply(msg.peer.chat_id(), msg.id, text).await
    }

    /// Route one bot-command message.
    pub async fn route(&self, msg: &MessageEvent) -> Result<()> {
        let MessagePayload::Text { text, .. } = &msg.payload else {
            return Ok(());
        };

        if match_command(text, "start", &self.me.username) {
            if let Some(greeting) = &self.cfg.start_message {
                self.reply(msg, greeting).await?;
            }
            return Ok(());
        }
        if match_command(text, "id", &self.me.username) {
            return self.handle_id(msg).await;
        }
        if msg.peer.is_private() {
            // Only the ungated commands work in a 1:1 chat.
            return Ok(());
        }

        let is_portal = match_command(text, "portal", &self.me.username);
        let is_invite = match_command(text, "invite", &self.me.username);
        if !is_portal && !is_invite {
            return Ok(());
        }

        let Some(sender) = msg.sender_user() else {
            // A sender that isn't a plain user cannot be authorized.
            return self.reply(msg, NO_PERMISSION).await;
        };
        if !self.permissions.authorize(&msg.peer, sender).await {
            return self.reply(msg, NO_PERMISSION).await;
        }

        if is_portal {
            self.handle_portal(msg).await
        } else {
            // Argument keeps its original case; only the command token is
            // matched case-insensitively.
            let arg = match text.find(' ') {
                Some(i) => &text[i + 1..],
                None => "",
            };
            self.handle_invite(msg, arg).await
        }
    }

    async fn handle_id(&self, msg: &MessageEvent) -> Result<()> {
        // The prefixed forms let the user pass the id straight to the
        // Matrix-side bridge command without knowing the chat kind.
        let text = match msg.peer {
            PeerRef::Channel(id) => format!("-100{}", id.0),
            PeerRef::Group(id) => (-id.0).to_string(),
            PeerRef::User(id) => format!(
                "Your user ID is {}.\n\nIf you're trying to bridge a group chat to Matrix, \
                 you must run the command in the group, not here. \
                 **The ID above will not work** with `!tg bridge`.",
                id.0
            ),
        };
        self.reply(msg, &text).await
    }

    async fn handle_portal(&self, msg: &MessageEvent) -> Result<()> {
        if !self.cfg.authless_portals {
            return self
                .reply(msg, "This bridge doesn't allow portal creation from Telegram.")
                .await;
        }

        let portal = self.portals.portal_info(&msg.peer).await?;
        if !portal.allow_bridging {
            return self
                .reply(msg, "This bridge doesn't allow bridging this chat.")
                .await;
        }

        let portal = self.portals.create_room(&msg.peer).await?;
        match (&portal.room_id, &portal.alias) {
            (Some(_), Some(alias)) => {
                self.reply(
                    msg,
                    &format!("Portal is public: [{alias}](https://matrix.to/#/{alias})"),
                )
                .await
            }
            (Some(_), None) => {
                self.reply(msg, "Portal is not public. Use `/invite <mxid>` to get an invite.")
                    .await
            }
            _ => Ok(()),
        }
    }

    async fn handle_invite(&self, msg: &MessageEvent, arg: &str) -> Result<()> {
        if arg.is_empty() {
            return self.reply(msg, "Usage: `/invite <mxid>`").await;
        }
        let portal = self.portals.portal_info(&msg.peer).await?;
        if portal.room_id.is_none() {
            return self
                .reply(msg, "Portal does not have Matrix room. Create one with /portal first.")
                .await;
        }
        if !looks_like_matrix_id(arg) {
            return self.reply(msg, "That doesn't look like a Matrix ID.").await;
        }

        let user = self.users.by_matrix_id(arg).await?;
        if !user.relay_whitelisted {
            return self
                .reply(msg, "That user is not whitelisted to use the bridge.")
                .await;
        }
        if user.logged_in {
            // Logged-in users have a native presence in the chat already;
            // point the inviter at it instead of relaying.
            let displayname = user
                .remote_username
                .as_ref()
                .map(|u| format!("@{u}"))
                .or_else(|| user.displayname.clone())
                .unwrap_or_else(|| user.matrix_id.clone());
            let target = user.remote_id.map(|id| id.0).unwrap_or_default();
            return self
                .reply(
                    msg,
                    &format!(
                        "That user seems to be logged in. \
                         Just invite [{displayname}](tg://user?id={target})"
                    ),
                )
                .await;
        }

        self.portals.invite(&msg.peer, arg).await?;
        self.reply(msg, &format!("Invited `{arg}` to the portal.")).await
    }
}
