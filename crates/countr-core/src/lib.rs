//! Core types for countr
//!
//! This crate provides the chat-platform data model shared by every other
//! crate: snowflake ids, channels, roles, members and messages.

mod channel;
mod id;
mod member;
mod message;

pub use channel::{Channel, ChannelKind};
pub use id::{ChannelId, GuildId, IdError, MessageId, RoleId, UserId};
pub use member::{Member, Role, User};
pub use message::{Message, MessageRef};

/// Maximum number of pinned messages a channel can hold
pub const PIN_LIMIT: usize = 50;

/// Markup that mentions the whole guild
pub const EVERYONE_MENTION: &str = "@everyone";
