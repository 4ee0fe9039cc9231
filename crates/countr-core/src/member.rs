//! Users, guild members and roles

use serde::{Deserialize, Serialize};

use crate::id::{RoleId, UserId};

/// A chat user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,

    /// Legacy four-digit discriminator ("0" for migrated accounts)
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            discriminator: default_discriminator(),
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = discriminator.into();
        self
    }

    /// `username#discriminator`, or just the username for migrated accounts
    pub fn tag(&self) -> String {
        if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }
}

/// A user's membership in a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn new(user: User) -> Self {
        Self {
            user,
            nickname: None,
            roles: Vec::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_role(mut self, role: RoleId) -> Self {
        self.roles.push(role);
        self
    }

    /// Nickname if set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }

    pub fn mention(&self) -> String {
        self.user.id.mention()
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// A guild role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag() {
        let legacy = User::new(UserId::new(1), "Ada").with_discriminator("0001");
        assert_eq!(legacy.tag(), "Ada#0001");

        let migrated = User::new(UserId::new(2), "grace");
        assert_eq!(migrated.tag(), "grace");
    }

    #[test]
    fn test_display_name() {
        let member = Member::new(User::new(UserId::new(1), "ada"));
        assert_eq!(member.display_name(), "ada");

        let nicked = member.with_nickname("Countess");
        assert_eq!(nicked.display_name(), "Countess");
        assert_eq!(nicked.mention(), "<@1>");
    }
}
