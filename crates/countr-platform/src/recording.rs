//! In-memory platform that records every call
//!
//! Backs the `countr simulate` dry run and the flow tests. Calls are recorded
//! in the order they were attempted, including calls that fail.

use async_trait::async_trait;
use countr_core::{
    Channel, ChannelId, GuildId, Member, MessageId, MessageRef, Role, RoleId, UserId, PIN_LIMIT,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::{
    GuildDirectory, GuildSnapshot, OutgoingMessage, PermissionOverwrite, Platform, PlatformError,
    PlatformResult,
};

/// First id handed out for messages sent through the recording platform
const FIRST_SENT_MESSAGE_ID: u64 = 1 << 40;

/// A platform call as recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    AddRole {
        user: UserId,
        role: RoleId,
    },
    RemoveRole {
        user: UserId,
        role: RoleId,
    },
    SendMessage {
        channel: ChannelId,
        message: OutgoingMessage,
    },
    Pin(MessageRef),
    Unpin(MessageRef),
    FetchPinned(ChannelId),
    EditOverwrite {
        channel: ChannelId,
        role: RoleId,
        overwrite: PermissionOverwrite,
    },
}

impl PlatformCall {
    pub fn kind(&self) -> CallKind {
        match self {
            PlatformCall::AddRole { .. } => CallKind::AddRole,
            PlatformCall::RemoveRole { .. } => CallKind::RemoveRole,
            PlatformCall::SendMessage { .. } => CallKind::SendMessage,
            PlatformCall::Pin(_) => CallKind::Pin,
            PlatformCall::Unpin(_) => CallKind::Unpin,
            PlatformCall::FetchPinned(_) => CallKind::FetchPinned,
            PlatformCall::EditOverwrite { .. } => CallKind::EditOverwrite,
        }
    }
}

/// Call kinds, used to inject failures and filter the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    AddRole,
    RemoveRole,
    SendMessage,
    Pin,
    Unpin,
    FetchPinned,
    EditOverwrite,
}

/// In-memory [`Platform`] for a single guild
pub struct RecordingPlatform {
    guild_id: GuildId,
    roles: Vec<Role>,
    channels: Vec<Channel>,
    members: DashMap<UserId, Member>,
    /// Pinned message ids per channel, newest first
    pins: DashMap<ChannelId, Vec<MessageId>>,
    failures: DashMap<CallKind, PlatformError>,
    calls: Mutex<Vec<PlatformCall>>,
    next_message_id: AtomicU64,
}

impl RecordingPlatform {
    /// Build a platform serving the given guild snapshot
    pub fn new(snapshot: GuildSnapshot) -> Self {
        let guild_id = snapshot.id;
        let channels = snapshot
            .channels
            .into_iter()
            .map(|channel| channel.with_guild(guild_id))
            .collect();

        Self {
            guild_id,
            roles: snapshot.roles,
            channels,
            members: snapshot
                .members
                .into_iter()
                .map(|member| (member.user.id, member))
                .collect(),
            pins: snapshot.pins.into_iter().collect(),
            failures: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(FIRST_SENT_MESSAGE_ID),
        }
    }

    /// Make every call of the given kind fail with `error`
    pub fn fail(&self, kind: CallKind, error: PlatformError) {
        self.failures.insert(kind, error);
    }

    /// Stop injecting failures for the given kind
    pub fn recover(&self, kind: CallKind) {
        self.failures.remove(&kind);
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.log().clone()
    }

    /// Recorded calls of one kind, in order
    pub fn calls_of(&self, kind: CallKind) -> Vec<PlatformCall> {
        self.log()
            .iter()
            .filter(|call| call.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.log().clear();
    }

    /// Current state of a member
    pub fn member(&self, user: UserId) -> Option<Member> {
        self.members.get(&user).map(|m| m.clone())
    }

    /// Current pins of a channel, newest first
    pub fn pins(&self, channel: ChannelId) -> Vec<MessageId> {
        self.pins
            .get(&channel)
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<PlatformCall>> {
        // A panicking test thread must not hide the calls recorded so far
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and return the injected failure for its kind, if any
    fn record(&self, call: PlatformCall) -> PlatformResult<()> {
        let kind = call.kind();
        trace!(?call, "Recording platform call");
        self.log().push(call);

        match self.failures.get(&kind) {
            Some(error) => {
                debug!(?kind, error = %error.value(), "Injected platform failure");
                Err(error.value().clone())
            }
            None => Ok(()),
        }
    }

    fn check_guild(&self, guild: GuildId) -> PlatformResult<()> {
        if guild == self.guild_id {
            Ok(())
        } else {
            Err(PlatformError::NotFound(format!("guild {}", guild)))
        }
    }

    fn has_role(&self, role: RoleId) -> bool {
        role == self.guild_id.everyone_role() || self.roles.iter().any(|r| r.id == role)
    }
}

impl GuildDirectory for RecordingPlatform {
    fn role(&self, guild: GuildId, role: RoleId) -> Option<Role> {
        if guild != self.guild_id {
            return None;
        }
        if role == guild.everyone_role() {
            return Some(Role::new(role, "@everyone"));
        }
        self.roles.iter().find(|r| r.id == role).cloned()
    }

    fn roles(&self, guild: GuildId) -> Vec<Role> {
        if guild != self.guild_id {
            return Vec::new();
        }
        self.roles.clone()
    }

    fn channel(&self, guild: GuildId, channel: ChannelId) -> Option<Channel> {
        if guild != self.guild_id {
            return None;
        }
        self.channels.iter().find(|c| c.id == channel).cloned()
    }

    fn channels(&self, guild: GuildId) -> Vec<Channel> {
        if guild != self.guild_id {
            return Vec::new();
        }
        self.channels.clone()
    }

    fn role_members(&self, guild: GuildId, role: RoleId) -> Vec<UserId> {
        if guild != self.guild_id {
            return Vec::new();
        }
        let mut members: Vec<UserId> = self
            .members
            .iter()
            .filter(|m| m.has_role(role))
            .map(|m| m.user.id)
            .collect();
        members.sort();
        members
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn add_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> PlatformResult<()> {
        self.record(PlatformCall::AddRole { user, role })?;
        self.check_guild(guild)?;
        if !self.has_role(role) {
            return Err(PlatformError::NotFound(format!("role {}", role)));
        }

        let mut member = self
            .members
            .get_mut(&user)
            .ok_or_else(|| PlatformError::NotFound(format!("member {}", user)))?;
        if !member.has_role(role) {
            member.roles.push(role);
        }
        Ok(())
    }

    async fn remove_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> PlatformResult<()> {
        self.record(PlatformCall::RemoveRole { user, role })?;
        self.check_guild(guild)?;

        let mut member = self
            .members
            .get_mut(&user)
            .ok_or_else(|| PlatformError::NotFound(format!("member {}", user)))?;
        member.roles.retain(|r| *r != role);
        Ok(())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId> {
        self.record(PlatformCall::SendMessage { channel, message })?;
        if !self.channels.iter().any(|c| c.id == channel) {
            return Err(PlatformError::NotFound(format!("channel {}", channel)));
        }
        Ok(MessageId::new(
            self.next_message_id.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn pin_message(&self, message: MessageRef) -> PlatformResult<()> {
        self.record(PlatformCall::Pin(message))?;

        let mut pins = self.pins.entry(message.channel_id).or_default();
        if pins.contains(&message.message_id) {
            return Ok(());
        }
        if pins.len() >= PIN_LIMIT {
            return Err(PlatformError::PinLimitReached);
        }
        pins.insert(0, message.message_id);
        Ok(())
    }

    async fn unpin_message(&self, message: MessageRef) -> PlatformResult<()> {
        self.record(PlatformCall::Unpin(message))?;

        let mut pins = self
            .pins
            .get_mut(&message.channel_id)
            .ok_or_else(|| PlatformError::NotFound(format!("message {}", message.message_id)))?;
        let before = pins.len();
        pins.retain(|id| *id != message.message_id);
        if pins.len() == before {
            return Err(PlatformError::NotFound(format!(
                "message {}",
                message.message_id
            )));
        }
        Ok(())
    }

    async fn pinned_messages(&self, channel: ChannelId) -> PlatformResult<Vec<MessageId>> {
        self.record(PlatformCall::FetchPinned(channel))?;
        Ok(self.pins(channel))
    }

    async fn edit_permission_overwrite(
        &self,
        channel: ChannelId,
        role: RoleId,
        overwrite: PermissionOverwrite,
    ) -> PlatformResult<()> {
        self.record(PlatformCall::EditOverwrite {
            channel,
            role,
            overwrite,
        })?;
        if !self.channels.iter().any(|c| c.id == channel) {
            return Err(PlatformError::NotFound(format!("channel {}", channel)));
        }
        Ok(())
    }
}

impl From<GuildSnapshot> for RecordingPlatform {
    fn from(snapshot: GuildSnapshot) -> Self {
        Self::new(snapshot)
    }
}

/// Snapshot the platform's current state, e.g. after a dry run
impl From<&RecordingPlatform> for GuildSnapshot {
    fn from(platform: &RecordingPlatform) -> Self {
        let mut members: Vec<Member> = platform.members.iter().map(|m| m.clone()).collect();
        members.sort_by_key(|m| m.user.id);
        let pins: HashMap<ChannelId, Vec<MessageId>> = platform
            .pins
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        GuildSnapshot {
            id: platform.guild_id,
            roles: platform.roles.clone(),
            channels: platform.channels.clone(),
            members,
            pins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countr_core::{ChannelKind, User};

    const GUILD: GuildId = GuildId::new(1);
    const CHANNEL: ChannelId = ChannelId::new(20);
    const ROLE: RoleId = RoleId::new(10);
    const USER: UserId = UserId::new(30);

    fn platform() -> RecordingPlatform {
        RecordingPlatform::new(
            GuildSnapshot::new(GUILD)
                .with_role(Role::new(ROLE, "Counter"))
                .with_channel(Channel::new(CHANNEL, "counting", ChannelKind::Text))
                .with_member(Member::new(User::new(USER, "ada"))),
        )
    }

    #[tokio::test]
    async fn test_role_mutation() {
        let platform = platform();
        platform.add_member_role(GUILD, USER, ROLE).await.unwrap();
        assert!(platform.member(USER).unwrap().has_role(ROLE));
        assert_eq!(platform.role_members(GUILD, ROLE), vec![USER]);

        platform.remove_member_role(GUILD, USER, ROLE).await.unwrap();
        assert!(!platform.member(USER).unwrap().has_role(ROLE));
        assert_eq!(platform.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_member() {
        let platform = platform();
        let err = platform
            .add_member_role(GUILD, UserId::new(99), ROLE)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
        // Failed calls are still recorded
        assert_eq!(platform.calls_of(CallKind::AddRole).len(), 1);
    }

    #[tokio::test]
    async fn test_pin_limit() {
        let full: Vec<MessageId> = (0..PIN_LIMIT as u64).map(MessageId::new).collect();
        let platform = RecordingPlatform::new(
            GuildSnapshot::new(GUILD)
                .with_channel(Channel::new(CHANNEL, "counting", ChannelKind::Text))
                .with_pins(CHANNEL, full),
        );

        let message = MessageRef::new(CHANNEL, MessageId::new(500));
        assert_eq!(
            platform.pin_message(message).await.unwrap_err(),
            PlatformError::PinLimitReached
        );

        let oldest = MessageRef::new(CHANNEL, MessageId::new(PIN_LIMIT as u64 - 1));
        platform.unpin_message(oldest).await.unwrap();
        platform.pin_message(message).await.unwrap();
        assert_eq!(platform.pins(CHANNEL)[0], MessageId::new(500));
        assert_eq!(platform.pins(CHANNEL).len(), PIN_LIMIT);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let platform = platform();
        platform.fail(
            CallKind::SendMessage,
            PlatformError::MissingPermissions("SEND_MESSAGES".into()),
        );
        let result = platform
            .send_message(CHANNEL, OutgoingMessage::new("hello"))
            .await;
        assert!(matches!(result, Err(PlatformError::MissingPermissions(_))));

        platform.recover(CallKind::SendMessage);
        assert!(platform
            .send_message(CHANNEL, OutgoingMessage::new("hello"))
            .await
            .is_ok());
        assert_eq!(platform.calls_of(CallKind::SendMessage).len(), 2);
    }

    #[test]
    fn test_directory_scoped_to_guild() {
        let platform = platform();
        assert!(platform.channel(GUILD, CHANNEL).is_some());
        assert!(platform.channel(GuildId::new(2), CHANNEL).is_none());
        assert_eq!(platform.role(GUILD, GUILD.everyone_role()).unwrap().name, "@everyone");
        assert_eq!(platform.channel(GUILD, CHANNEL).unwrap().guild_id, Some(GUILD));
    }
}
