use std::sync::Arc;

use tracing::info;

use crate::{
    commands::CommandRouter,
    config::Config,
    dispatcher::UpdateDispatcher,
    domain::{BotIdentity, ChatId, PeerRef},
    permissions::PermissionResolver,
    ports::{ChatStore, PortalGateway, RemoteClient, UserStore},
    registry::ChatRegistry,
    Result,
};

/// The relay identity: wires registry, permission resolver, command router
/// and dispatcher together and owns the login/startup sequence.
pub struct RelayBot {
    identity: BotIdentity,
    registry: Arc<ChatRegistry>,
    dispatcher: UpdateDispatcher,
}

impl RelayBot {
    /// Sign in and bring the control plane up.
    ///
    /// Reconciliation runs to completion here, before any caller can hand
    /// updates to the dispatcher, so a live service event never races a stale
    /// reconciliation result.
    pub async fn start(
        cfg: Arc<Config>,
        client: Arc<dyn RemoteClient>,
        store: Arc<dyn ChatStore>,
        users: Arc<dyn UserStore>,
        portals: Arc<dyn PortalGateway>,
    ) -> Result<Self> {
        let registry = Arc::new(ChatRegistry::new(store));
        registry.load().await?;

        client.sign_in_bot(&cfg.bot_token).await?;
        let me = client.get_me().await?;
        let identity = BotIdentity {
            remote_id: me.id,
            matrix_id: cfg.matrix_id_for(me.id),
            username: me.username,
        };
        info!(
            id = identity.remote_id.0,
            username = identity.username.as_str(),
            "relay bot logged in"
        );

        let permissions =
            Arc::new(PermissionResolver::from_config(&cfg, users.clone(), client.clone()).await);

        registry.reconcile(client.as_ref()).await?;

        let router = Arc::new(CommandRouter::new(
            cfg,
            identity.clone(),
            client,
            users,
            portals,
            permissions,
        ));
        let dispatcher = UpdateDispatcher::new(identity.clone(), registry.clone(), router);

        Ok(Self {
            identity,
            registry,
            dispatcher,
        })
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn dispatcher(&self) -> &UpdateDispatcher {
        &self.dispatcher
    }

    /// Track a chat whose portal was created from the Matrix side.
    pub async fn register_portal(&self, peer: &PeerRef) -> Result<()> {
        self.registry.add(peer.chat_id(), peer.kind()).await
    }

    pub async fn unregister_portal(&self, id: ChatId) -> Result<()> {
        self.registry.remove(id).await
    }

    pub async fn is_in_chat(&self, id: ChatId) -> bool {
        self.registry.contains(id).await
    }
}
