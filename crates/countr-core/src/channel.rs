//! Channel model

use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, GuildId};

/// Kind of a guild channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Text,
    News,
    Voice,
    Category,
    PublicThread,
    PrivateThread,
    NewsThread,
}

impl ChannelKind {
    /// Whether messages can be sent to this channel
    pub fn is_text_based(self) -> bool {
        matches!(
            self,
            ChannelKind::Text
                | ChannelKind::News
                | ChannelKind::PublicThread
                | ChannelKind::PrivateThread
                | ChannelKind::NewsThread
        )
    }

    /// Whether the channel carries its own permission overwrites.
    ///
    /// Threads inherit from their parent channel, so only text and news
    /// channels qualify.
    pub fn supports_permission_overwrites(self) -> bool {
        matches!(self, ChannelKind::Text | ChannelKind::News)
    }
}

/// A guild channel as seen by the bot's cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,

    /// Owning guild; filled in by whoever builds the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,

    pub name: String,

    #[serde(default)]
    pub kind: ChannelKind,
}

impl Channel {
    pub fn new(id: ChannelId, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id,
            guild_id: None,
            name: name.into(),
            kind,
        }
    }

    pub fn with_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }
}
