//! Messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::id::{ChannelId, GuildId, MessageId};
use crate::member::{Member, User};

/// A message posted in a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// None for direct messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,

    pub channel_id: ChannelId,

    #[serde(default)]
    pub channel_kind: ChannelKind,

    pub author: User,

    /// Guild membership of the author, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,

    #[serde(default)]
    pub content: String,

    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, channel_id: ChannelId, author: User) -> Self {
        Self {
            id,
            guild_id: None,
            channel_id,
            channel_kind: ChannelKind::Text,
            author,
            member: None,
            content: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn in_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn with_channel_kind(mut self, kind: ChannelKind) -> Self {
        self.channel_kind = kind;
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.member = Some(member);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Reference to this message for pin/unpin calls
    pub fn reference(&self) -> MessageRef {
        MessageRef::new(self.channel_id, self.id)
    }
}

/// Points at a message in a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}
