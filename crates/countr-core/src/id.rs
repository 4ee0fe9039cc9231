//! Snowflake identifiers for guilds, channels, roles, users and messages

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid snowflake ids
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("id cannot be empty")]
    Empty,

    #[error("id must be a decimal number: {0}")]
    NotNumeric(String),
}

/// Parse a decimal snowflake, rejecting signs and whitespace inside the digits
fn parse_snowflake(s: &str) -> Result<u64, IdError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(IdError::NotNumeric(s.to_string()));
    }
    s.parse().map_err(|_| IdError::NotNumeric(s.to_string()))
}

/// Ids are written as numbers, but map keys in YAML/JSON arrive as strings
fn deserialize_snowflake<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => parse_snowflake(&s).map_err(serde::de::Error::custom),
    }
}

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an id from its raw value
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw value
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_snowflake(s).map(Self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserialize_snowflake(deserializer).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(
    /// Identifies a guild (server)
    GuildId
);
snowflake_id!(
    /// Identifies a channel or thread
    ChannelId
);
snowflake_id!(
    /// Identifies a role
    RoleId
);
snowflake_id!(
    /// Identifies a user
    UserId
);
snowflake_id!(
    /// Identifies a message
    MessageId
);

impl GuildId {
    /// The guild's default role shares the guild's id
    pub const fn everyone_role(self) -> RoleId {
        RoleId(self.0)
    }
}

impl RoleId {
    /// Role mention markup (`<@&id>`)
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }

    /// Parse an id or a role mention
    pub fn parse_mention(raw: &str) -> Result<Self, IdError> {
        strip_mention(raw, "<@&").parse()
    }
}

impl ChannelId {
    /// Channel mention markup (`<#id>`)
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }

    /// Parse an id or a channel mention
    pub fn parse_mention(raw: &str) -> Result<Self, IdError> {
        strip_mention(raw, "<#").parse()
    }
}

impl UserId {
    /// User mention markup (`<@id>`)
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

fn strip_mention<'a>(raw: &'a str, prefix: &str) -> &'a str {
    let raw = raw.trim();
    raw.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(raw)
}
