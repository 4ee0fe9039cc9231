//! Chat-platform client surface
//!
//! Defines the narrow interface the flow engine needs from the chat platform:
//! cached guild lookups ([`GuildDirectory`]) and the asynchronous calls that
//! mutate roles, messages, pins and permissions ([`Platform`]).
//!
//! The real client lives in the bot binary. This crate also ships
//! [`RecordingPlatform`], an in-memory implementation that records every call,
//! used for dry runs and tests.

mod recording;
mod snapshot;

pub use recording::{CallKind, PlatformCall, RecordingPlatform};
pub use snapshot::GuildSnapshot;

use async_trait::async_trait;
use countr_core::{Channel, ChannelId, GuildId, MessageId, MessageRef, Role, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type for platform calls
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors raised by the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("missing permissions: {0}")]
    MissingPermissions(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("maximum number of pinned messages reached")]
    PinLimitReached,

    #[error("request failed: {0}")]
    Request(String),
}

/// Mention kinds a message is allowed to ping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    Everyone,
    Users,
    Roles,
}

/// Allowed-mentions policy for an outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllowedMentions {
    pub parse: Vec<MentionKind>,
}

impl AllowedMentions {
    /// Nothing pings
    pub fn none() -> Self {
        Self::default()
    }

    /// Everyone, user and role mentions all ping
    pub fn all() -> Self {
        Self {
            parse: vec![MentionKind::Everyone, MentionKind::Users, MentionKind::Roles],
        }
    }

    pub fn allows(&self, kind: MentionKind) -> bool {
        self.parse.contains(&kind)
    }
}

/// A message to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub content: String,
    pub allowed_mentions: AllowedMentions,
}

impl OutgoingMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            allowed_mentions: AllowedMentions::none(),
        }
    }

    pub fn with_allowed_mentions(mut self, allowed_mentions: AllowedMentions) -> Self {
        self.allowed_mentions = allowed_mentions;
        self
    }
}

/// Edit to a role's permission overwrite on a channel.
///
/// `None` leaves the permission untouched, `Some(false)` denies it,
/// `Some(true)` allows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_messages: Option<bool>,
}

impl PermissionOverwrite {
    pub fn deny_send_messages() -> Self {
        Self {
            send_messages: Some(false),
        }
    }
}

/// Cached guild lookups. These never hit the network.
pub trait GuildDirectory: Send + Sync {
    /// Look up a role of a guild
    fn role(&self, guild: GuildId, role: RoleId) -> Option<Role>;

    /// All roles of a guild
    fn roles(&self, guild: GuildId) -> Vec<Role>;

    /// Look up a channel of a guild
    fn channel(&self, guild: GuildId, channel: ChannelId) -> Option<Channel>;

    /// All channels of a guild
    fn channels(&self, guild: GuildId) -> Vec<Channel>;

    /// Cached members holding a role. Members absent from the cache are not
    /// returned.
    fn role_members(&self, guild: GuildId, role: RoleId) -> Vec<UserId>;
}

/// Asynchronous platform calls used by flow actions
#[async_trait]
pub trait Platform: GuildDirectory {
    /// Add a role to a guild member
    async fn add_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> PlatformResult<()>;

    /// Remove a role from a guild member
    async fn remove_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> PlatformResult<()>;

    /// Send a message, returning the new message's id
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId>;

    /// Pin a message. Fails with [`PlatformError::PinLimitReached`] when the
    /// channel already holds [`countr_core::PIN_LIMIT`] pins.
    async fn pin_message(&self, message: MessageRef) -> PlatformResult<()>;

    /// Unpin a message
    async fn unpin_message(&self, message: MessageRef) -> PlatformResult<()>;

    /// Pinned messages of a channel, newest first
    async fn pinned_messages(&self, channel: ChannelId) -> PlatformResult<Vec<MessageId>>;

    /// Edit a role's permission overwrite on a channel
    async fn edit_permission_overwrite(
        &self,
        channel: ChannelId,
        role: RoleId,
        overwrite: PermissionOverwrite,
    ) -> PlatformResult<()>;
}
