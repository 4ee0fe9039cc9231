//! Per-channel counting data for countr
//!
//! This crate provides the GuildStore, which holds the persisted counting
//! state of every counting channel in a guild: the current count and the
//! per-user scores. Entries are keyed by channel id, so events in different
//! channels never contend on the same entry.

use countr_core::{ChannelId, GuildId, MessageId, UserId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The current count of a channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountState {
    /// Last correct number
    pub number: u64,

    /// Who posted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// The message it was posted in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
}

impl CountState {
    /// The structured zero value: number 0, no user, no message
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn counted_by(mut self, user_id: UserId, message_id: MessageId) -> Self {
        self.user_id = Some(user_id);
        self.message_id = Some(message_id);
        self
    }
}

/// Counting data of one channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
    #[serde(default)]
    pub count: CountState,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub scores: HashMap<UserId, u64>,
}

impl ChannelData {
    pub fn with_count(number: u64) -> Self {
        Self {
            count: CountState::new(number),
            scores: HashMap::new(),
        }
    }
}

/// Serializable form of a guild's counting data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildData {
    pub guild_id: GuildId,

    #[serde(default)]
    pub channels: HashMap<ChannelId, ChannelData>,
}

/// Counting data of every counting channel in a guild
#[derive(Debug)]
pub struct GuildStore {
    guild_id: GuildId,
    channels: DashMap<ChannelId, ChannelData>,
}

impl GuildStore {
    /// Create an empty store for a guild
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            channels: DashMap::new(),
        }
    }

    /// Restore a store from its serialized form
    pub fn from_data(data: GuildData) -> Self {
        Self {
            guild_id: data.guild_id,
            channels: data.channels.into_iter().collect(),
        }
    }

    /// Serialize the current contents
    pub fn to_data(&self) -> GuildData {
        GuildData {
            guild_id: self.guild_id,
            channels: self
                .channels
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect(),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Get a copy of a channel's counting data
    pub fn get(&self, channel: ChannelId) -> Option<ChannelData> {
        self.channels.get(&channel).map(|c| c.clone())
    }

    /// Check whether a channel is a counting channel
    pub fn contains(&self, channel: ChannelId) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Register a counting channel, replacing existing data
    #[instrument(skip(self, data), fields(guild = %self.guild_id))]
    pub fn insert(&self, channel: ChannelId, data: ChannelData) -> Option<ChannelData> {
        debug!(channel = %channel, count = data.count.number, "Storing channel data");
        self.channels.insert(channel, data)
    }

    /// Remove a counting channel
    pub fn remove(&self, channel: ChannelId) -> Option<ChannelData> {
        self.channels.remove(&channel).map(|(_, data)| data)
    }

    /// Mutate a channel's data in place. Returns None if the channel has no data.
    pub fn update<R>(
        &self,
        channel: ChannelId,
        f: impl FnOnce(&mut ChannelData) -> R,
    ) -> Option<R> {
        self.channels
            .get_mut(&channel)
            .map(|mut data| f(data.value_mut()))
    }

    /// Current count of a channel
    pub fn count(&self, channel: ChannelId) -> Option<u64> {
        self.channels.get(&channel).map(|c| c.count.number)
    }

    /// Replace a channel's count. Returns false if the channel has no data.
    pub fn set_count(&self, channel: ChannelId, count: CountState) -> bool {
        self.update(channel, |data| data.count = count).is_some()
    }

    /// Set a channel's count to the zero value. Returns false if the channel
    /// has no data.
    #[instrument(skip(self), fields(guild = %self.guild_id))]
    pub fn reset_count(&self, channel: ChannelId) -> bool {
        let reset = self.set_count(channel, CountState::zero());
        if reset {
            debug!(channel = %channel, "Count reset");
        }
        reset
    }

    /// A user's score in a channel (0 when unknown)
    pub fn score(&self, channel: ChannelId, user: UserId) -> u64 {
        self.channels
            .get(&channel)
            .and_then(|c| c.scores.get(&user).copied())
            .unwrap_or(0)
    }

    /// Add to a user's score, returning the new score. Returns None if the
    /// channel has no data.
    pub fn add_score(&self, channel: ChannelId, user: UserId, amount: u64) -> Option<u64> {
        self.update(channel, |data| {
            let score = data.scores.entry(user).or_insert(0);
            *score = score.saturating_add(amount);
            *score
        })
    }

    /// Ids of all counting channels
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self.channels.iter().map(|c| *c.key()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Thread-safe handle to a guild store
pub type SharedGuildStore = Arc<GuildStore>;
