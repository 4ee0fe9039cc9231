//! Serializable snapshot of a guild's cached state

use countr_core::{Channel, ChannelId, GuildId, Member, MessageId, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Roles, channels, members and pins of one guild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildSnapshot {
    pub id: GuildId,

    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub channels: Vec<Channel>,

    #[serde(default)]
    pub members: Vec<Member>,

    /// Pinned message ids per channel, newest first
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub pins: HashMap<ChannelId, Vec<MessageId>>,
}

impl GuildSnapshot {
    pub fn new(id: GuildId) -> Self {
        Self {
            id,
            roles: Vec::new(),
            channels: Vec::new(),
            members: Vec::new(),
            pins: HashMap::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel.with_guild(self.id));
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_pins(mut self, channel: ChannelId, pins: Vec<MessageId>) -> Self {
        self.pins.insert(channel, pins);
        self
    }
}
