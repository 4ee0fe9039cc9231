//! Bot configuration file
//!
//! One file describes a guild (its cached roles, channels and members) and
//! the counting channels with their counts and flows.

use anyhow::{Context, Result};
use countr_core::{ChannelId, UserId};
use countr_flows::{ActionCatalog, FlowConfig, FlowDefinition};
use countr_platform::{GuildDirectory, GuildSnapshot};
use countr_store::{ChannelData, CountState, GuildData, GuildStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub guild: GuildSnapshot,

    /// Counting channels, by id
    #[serde(default)]
    pub channels: BTreeMap<ChannelId, ChannelConfig>,
}

/// One counting channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Current count
    #[serde(default)]
    pub count: u64,

    /// Scores by user
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub scores: HashMap<UserId, u64>,

    #[serde(default)]
    pub flows: Vec<FlowConfig>,
}

/// A flow that failed to compile
#[derive(Debug)]
pub struct FlowIssue {
    pub channel: ChannelId,
    /// Position of the flow in the channel's list
    pub index: usize,
    pub name: Option<String>,
    pub error: countr_flows::FlowError,
}

impl FlowIssue {
    /// Flow name if set, otherwise its position
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", self.index + 1),
        }
    }
}

/// Result of compiling every flow of a configuration
#[derive(Debug, Default)]
pub struct CompiledFlows {
    /// Compiled flows per channel, in configuration order
    pub flows: BTreeMap<ChannelId, Vec<FlowDefinition>>,
    pub issues: Vec<FlowIssue>,
}

impl BotConfig {
    /// Load a configuration file, resolving includes and env vars
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: BotConfig = countr_config::load_config(path)
            .with_context(|| format!("loading {}", path.display()))?;
        debug!(
            guild = %config.guild.id,
            channels = config.channels.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Counting data of every configured channel
    pub fn store(&self) -> GuildStore {
        let channels = self
            .channels
            .iter()
            .map(|(id, channel)| {
                let data = ChannelData {
                    count: CountState::new(channel.count),
                    scores: channel.scores.clone(),
                };
                (*id, data)
            })
            .collect();

        GuildStore::from_data(GuildData {
            guild_id: self.guild.id,
            channels,
        })
    }

    /// Compile every flow against the guild. Flows that fail are reported
    /// in `issues` and left out of `flows`.
    pub fn compile(
        &self,
        catalog: &ActionCatalog,
        directory: &dyn GuildDirectory,
    ) -> CompiledFlows {
        let mut compiled = CompiledFlows::default();
        for (channel, config) in &self.channels {
            let mut flows = Vec::with_capacity(config.flows.len());
            for (index, flow) in config.flows.iter().enumerate() {
                match flow.compile(catalog, self.guild.id, directory) {
                    Ok(definition) => flows.push(definition),
                    Err(error) => compiled.issues.push(FlowIssue {
                        channel: *channel,
                        index,
                        name: flow.name.clone(),
                        error,
                    }),
                }
            }
            compiled.flows.insert(*channel, flows);
        }
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countr_core::RoleId;
    use countr_flows::{FlowStep, PropertyValue};
    use countr_platform::RecordingPlatform;

    const CONFIG: &str = r#"
guild:
  id: 1
  roles:
    - { id: 10, name: Counter }
  channels:
    - { id: 20, name: counting, kind: text }
  members:
    - user: { id: 30, username: ada, discriminator: "0001" }
      roles: [10]
channels:
  "20":
    count: 41
    scores: { "30": 12 }
    flows:
      - name: milestone
        triggers: [{ type: each, number: 100 }]
        actions:
          - { action: giverole, values: ["Counter"] }
      - name: broken
        triggers: [{ type: count_fail }]
        actions:
          - { action: giverole, values: ["Nobody"] }
"#;

    fn config() -> BotConfig {
        serde_yaml::from_str(CONFIG).unwrap()
    }

    #[test]
    fn test_parse() {
        let config = config();
        assert_eq!(config.guild.members[0].user.tag(), "ada#0001");
        let channel = &config.channels[&ChannelId::new(20)];
        assert_eq!(channel.count, 41);
        assert_eq!(channel.flows.len(), 2);
    }

    #[test]
    fn test_store() {
        let store = config().store();
        assert_eq!(store.count(ChannelId::new(20)), Some(41));
        assert_eq!(store.score(ChannelId::new(20), UserId::new(30)), 12);
    }

    #[test]
    fn test_compile_reports_issues() {
        let config = config();
        let platform = RecordingPlatform::new(config.guild.clone());
        let compiled = config.compile(&ActionCatalog::builtin(), &platform);

        let flows = &compiled.flows[&ChannelId::new(20)];
        assert_eq!(flows.len(), 1);
        assert_eq!(
            flows[0].steps,
            vec![FlowStep::new("giverole", vec![PropertyValue::Role(RoleId::new(10))])]
        );

        assert_eq!(compiled.issues.len(), 1);
        assert_eq!(compiled.issues[0].label(), "broken");
    }
}
