//! Property types
//!
//! Property types are the typed parameter kinds an action declares. Raw
//! configuration input is validated into a [`PropertyValue`] once, when a flow
//! is configured; the executor never re-validates stored values.

use countr_core::{ChannelId, GuildId, RoleId};
use countr_platform::GuildDirectory;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for raw property input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{raw}' is not a valid {kind}")]
    InvalidReference { kind: PropertyKind, raw: String },
}

/// Parameter kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Role,
    Channel,
    Text,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Role => "role",
            PropertyKind::Channel => "channel",
            PropertyKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A typed parameter an action requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyType {
    pub kind: PropertyKind,

    /// Short name shown in configuration UIs
    pub name: &'static str,

    /// What input is expected
    pub description: &'static str,
}

impl PropertyType {
    pub const ROLE: PropertyType = PropertyType {
        kind: PropertyKind::Role,
        name: "Role",
        description: "A role of the server, by mention, id or name",
    };

    pub const CHANNEL: PropertyType = PropertyType {
        kind: PropertyKind::Channel,
        name: "Channel",
        description: "A text channel of the server, by mention, id or name",
    };

    pub const TEXT: PropertyType = PropertyType {
        kind: PropertyKind::Text,
        name: "Text",
        description: "Any text. Placeholders: {count} {mention} {tag} {username} \
                      {nickname} {everyone} {score} {content}",
    };

    /// Validate raw configuration input against the guild
    pub fn validate(
        &self,
        raw: &str,
        guild: GuildId,
        directory: &dyn GuildDirectory,
    ) -> Result<PropertyValue, ValidationError> {
        match self.kind {
            PropertyKind::Role => resolve_role(raw, guild, directory).map(PropertyValue::Role),
            PropertyKind::Channel => {
                resolve_channel(raw, guild, directory).map(PropertyValue::Channel)
            }
            PropertyKind::Text => Some(PropertyValue::Text(raw.to_string())),
        }
        .ok_or_else(|| ValidationError::InvalidReference {
            kind: self.kind,
            raw: raw.to_string(),
        })
    }

    /// Whether a stored value fits this property
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        value.kind() == self.kind
    }
}

fn resolve_role(raw: &str, guild: GuildId, directory: &dyn GuildDirectory) -> Option<RoleId> {
    if let Ok(id) = RoleId::parse_mention(raw) {
        return directory.role(guild, id).map(|role| role.id);
    }

    let name = raw.trim().trim_start_matches('@');
    directory
        .roles(guild)
        .into_iter()
        .find(|role| role.name.eq_ignore_ascii_case(name))
        .map(|role| role.id)
}

fn resolve_channel(
    raw: &str,
    guild: GuildId,
    directory: &dyn GuildDirectory,
) -> Option<ChannelId> {
    if let Ok(id) = ChannelId::parse_mention(raw) {
        return directory
            .channel(guild, id)
            .filter(|channel| channel.kind.is_text_based())
            .map(|channel| channel.id);
    }

    let name = raw.trim().trim_start_matches('#');
    directory
        .channels(guild)
        .into_iter()
        .filter(|channel| channel.kind.is_text_based())
        .find(|channel| channel.name.eq_ignore_ascii_case(name))
        .map(|channel| channel.id)
}

/// A validated, bound property value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Role(RoleId),
    Channel(ChannelId),
    Text(String),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Role(_) => PropertyKind::Role,
            PropertyValue::Channel(_) => PropertyKind::Channel,
            PropertyValue::Text(_) => PropertyKind::Text,
        }
    }

    pub fn as_role(&self) -> Option<RoleId> {
        match self {
            PropertyValue::Role(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<ChannelId> {
        match self {
            PropertyValue::Channel(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Mentions for references, raw text otherwise
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Role(id) => f.write_str(&id.mention()),
            PropertyValue::Channel(id) => f.write_str(&id.mention()),
            PropertyValue::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countr_core::{Channel, ChannelKind, Role};
    use countr_platform::{GuildSnapshot, RecordingPlatform};

    const GUILD: GuildId = GuildId::new(1);

    fn directory() -> RecordingPlatform {
        RecordingPlatform::new(
            GuildSnapshot::new(GUILD)
                .with_role(Role::new(RoleId::new(10), "Counter"))
                .with_channel(Channel::new(ChannelId::new(20), "counting", ChannelKind::Text))
                .with_channel(Channel::new(ChannelId::new(21), "Lounge", ChannelKind::Voice))
                .with_channel(Channel::new(
                    ChannelId::new(22),
                    "milestones",
                    ChannelKind::PublicThread,
                )),
        )
    }

    #[test]
    fn test_role_by_mention_id_and_name() {
        let dir = directory();
        let expected = PropertyValue::Role(RoleId::new(10));
        assert_eq!(PropertyType::ROLE.validate("<@&10>", GUILD, &dir), Ok(expected.clone()));
        assert_eq!(PropertyType::ROLE.validate("10", GUILD, &dir), Ok(expected.clone()));
        assert_eq!(PropertyType::ROLE.validate("@counter", GUILD, &dir), Ok(expected));
    }

    #[test]
    fn test_unknown_role() {
        let dir = directory();
        assert_eq!(
            PropertyType::ROLE.validate("11", GUILD, &dir),
            Err(ValidationError::InvalidReference {
                kind: PropertyKind::Role,
                raw: "11".to_string(),
            })
        );
        assert!(PropertyType::ROLE.validate("Admins", GUILD, &dir).is_err());
        // Known role, wrong guild
        assert!(PropertyType::ROLE.validate("10", GuildId::new(2), &dir).is_err());
    }

    #[test]
    fn test_channel_must_be_text_based() {
        let dir = directory();
        assert_eq!(
            PropertyType::CHANNEL.validate("<#20>", GUILD, &dir),
            Ok(PropertyValue::Channel(ChannelId::new(20)))
        );
        assert_eq!(
            PropertyType::CHANNEL.validate("#milestones", GUILD, &dir),
            Ok(PropertyValue::Channel(ChannelId::new(22)))
        );

        let err = PropertyType::CHANNEL.validate("21", GUILD, &dir).unwrap_err();
        assert_eq!(err.to_string(), "'21' is not a valid channel");
        assert!(PropertyType::CHANNEL.validate("lounge", GUILD, &dir).is_err());
    }

    #[test]
    fn test_text_never_fails() {
        let dir = directory();
        assert_eq!(
            PropertyType::TEXT.validate("{count}!", GUILD, &dir),
            Ok(PropertyValue::Text("{count}!".to_string()))
        );
        assert_eq!(
            PropertyType::TEXT.validate("", GUILD, &dir),
            Ok(PropertyValue::Text(String::new()))
        );
    }

    #[test]
    fn test_display_and_accepts() {
        assert_eq!(PropertyValue::Role(RoleId::new(5)).to_string(), "<@&5>");
        assert_eq!(PropertyValue::Channel(ChannelId::new(6)).to_string(), "<#6>");
        assert_eq!(PropertyValue::Text("hi".into()).to_string(), "hi");

        assert!(PropertyType::ROLE.accepts(&PropertyValue::Role(RoleId::new(5))));
        assert!(!PropertyType::ROLE.accepts(&PropertyValue::Text("5".into())));
    }

    #[test]
    fn test_value_serde() {
        let value = PropertyValue::Role(RoleId::new(5));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"type": "role", "value": 5}));
        assert_eq!(serde_json::from_value::<PropertyValue>(json).unwrap(), value);
    }
}
