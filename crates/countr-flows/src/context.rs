//! Counting context
//!
//! The per-event bundle every action receives: the count, the actor's score,
//! the triggering message, the bot's counting message and the guild store.

use countr_core::{ChannelId, GuildId, Message, MessageRef};
use countr_store::{GuildStore, SharedGuildStore};
use std::sync::Arc;

/// Context for one counting event.
///
/// Built once per event and shared by reference with every action of a run.
/// The only mutable state reachable from it is the guild store.
#[derive(Debug, Clone)]
pub struct CountingContext {
    /// Current count
    pub count: u64,

    /// Running score of the user who triggered the event
    pub score: u64,

    /// Message that triggered the event
    pub message: Message,

    /// The bot's rendered count message for the channel
    pub counting_message: MessageRef,

    store: SharedGuildStore,
}

impl CountingContext {
    pub fn new(
        count: u64,
        score: u64,
        message: Message,
        counting_message: MessageRef,
        store: SharedGuildStore,
    ) -> Self {
        Self {
            count,
            score,
            message,
            counting_message,
            store,
        }
    }

    /// Context where the user's own message is the counting message
    pub fn for_message(count: u64, score: u64, message: Message, store: SharedGuildStore) -> Self {
        let counting_message = message.reference();
        Self::new(count, score, message, counting_message, store)
    }

    /// Persisted counting data of the guild
    pub fn store(&self) -> &GuildStore {
        &self.store
    }

    pub fn shared_store(&self) -> SharedGuildStore {
        Arc::clone(&self.store)
    }

    /// Guild the event happened in
    pub fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }

    /// Channel the event happened in
    pub fn channel_id(&self) -> ChannelId {
        self.message.channel_id
    }
}
