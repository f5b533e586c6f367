//! Control plane for a relay-style Telegram bridge bot.
//!
//! The relay identity is a single bot account that represents the Matrix side
//! inside Telegram group chats, without requiring every participant to log in.
//! This crate tracks which remote chats the bot belongs to, decides who may
//! run administrative commands, and routes inbound protocol updates to either
//! membership handling or command handling.
//!
//! Transports and storage engines are intentionally out of scope: the MTProto
//! client, the bridge user store, the portal/room layer and the chat
//! persistence all live behind ports (traits) in [`ports`].

pub mod bot;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod permissions;
pub mod ports;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::{Error, Result};
