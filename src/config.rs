use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::UserId, errors::Error, Result};

/// Typed configuration for the relay bot.
///
/// Keys mirror the bridge's `bridge.relaybot.*` configuration section, loaded
/// from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// Raw whitelist entries: numeric ids, or identifiers the client resolves
    /// at startup (see `PermissionResolver::from_config`).
    pub whitelist: Vec<String>,
    /// Enables the live group-admin check for users outside the whitelist.
    pub whitelist_group_admins: bool,
    /// Allows `/portal` to create rooms from the Telegram side.
    pub authless_portals: bool,
    /// Reply for `/start`; `None` keeps the bot silent.
    pub start_message: Option<String>,
    /// Puppet mxid template with a `{}` placeholder for the numeric id.
    pub matrix_id_template: String,
    /// Backing file for the default JSON chat store.
    pub chat_store_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("RELAYBOT_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "RELAYBOT_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let whitelist = parse_csv(env_str("RELAYBOT_WHITELIST"));
        let whitelist_group_admins = env_bool("RELAYBOT_WHITELIST_GROUP_ADMINS").unwrap_or(false);
        let authless_portals = env_bool("RELAYBOT_AUTHLESS_PORTALS").unwrap_or(false);
        let start_message = env_str("RELAYBOT_START_MESSAGE").and_then(non_empty);

        let matrix_id_template = env_str("RELAYBOT_MATRIX_ID_TEMPLATE")
            .and_then(non_empty)
            .unwrap_or_else(|| "@telegram_{}:localhost".to_string());
        if !matrix_id_template.contains("{}") {
            return Err(Error::Config(
                "RELAYBOT_MATRIX_ID_TEMPLATE must contain a {} placeholder".to_string(),
            ));
        }

        let chat_store_path = env_path("RELAYBOT_CHAT_STORE")
            .unwrap_or_else(|| PathBuf::from("/tmp/relaybot-chats.json"));

        Ok(Self {
            bot_token,
            whitelist,
            whitelist_group_admins,
            authless_portals,
            start_message,
            matrix_id_template,
            chat_store_path,
        })
    }

    /// Puppet mxid for a numeric Telegram id.
    pub fn matrix_id_for(&self, id: UserId) -> String {
        self.matrix_id_template.replace("{}", &id.0.to_string())
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
