//! Flow definitions
//!
//! A flow ties triggers to an ordered list of steps. [`FlowConfig`] is the raw
//! configuration form (action keys plus raw string values); compiling it
//! validates every value against the action's property types and yields a
//! [`FlowDefinition`].

use countr_core::GuildId;
use countr_platform::GuildDirectory;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{ActionCatalog, ActionDescriptor};
use crate::error::{FlowError, FlowResult};
use crate::property::PropertyValue;
use crate::trigger::{CountingEvent, Trigger};

/// One step of a flow: an action key with its bound values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub action: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<PropertyValue>,
}

impl FlowStep {
    pub fn new(action: impl Into<String>, values: Vec<PropertyValue>) -> Self {
        Self {
            action: action.into(),
            values,
        }
    }

    /// Step without bound values
    pub fn bare(action: impl Into<String>) -> Self {
        Self::new(action, Vec::new())
    }

    /// Look up the step's action and check the bound values against its
    /// declared properties. `index` is the step's position, for errors.
    pub fn resolve<'c>(
        &self,
        index: usize,
        catalog: &'c ActionCatalog,
    ) -> FlowResult<&'c ActionDescriptor> {
        let descriptor = catalog
            .resolve(&self.action)
            .map_err(|error| error.at_step(index))?;

        if self.values.len() != descriptor.arity() {
            return Err(FlowError::ArityMismatch {
                step: index,
                key: self.action.clone(),
                expected: descriptor.arity(),
                got: self.values.len(),
            });
        }

        let mismatch = descriptor
            .properties
            .iter()
            .zip(&self.values)
            .position(|(property, value)| !property.accepts(value));
        if let Some(position) = mismatch {
            return Err(FlowError::PropertyMismatch {
                step: index,
                key: self.action.clone(),
                index: position,
                expected: descriptor.properties[position].kind,
            });
        }

        Ok(descriptor)
    }
}

/// A configured flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Unique identifier
    pub id: String,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the flow runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// The flow fires when any trigger matches
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Steps, in execution order
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

fn default_enabled() -> bool {
    true
}

impl FlowDefinition {
    /// Create an enabled flow with a fresh id
    pub fn new(triggers: Vec<Trigger>, steps: Vec<FlowStep>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: None,
            enabled: true,
            triggers,
            steps,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name if set, otherwise the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Whether the flow should run for an event
    pub fn is_triggered_by(&self, event: &CountingEvent) -> bool {
        self.enabled && self.triggers.iter().any(|t| t.matches(event))
    }

    /// Preview of every step, in order
    pub fn explain(&self, catalog: &ActionCatalog) -> FlowResult<Vec<String>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let descriptor = step.resolve(index, catalog)?;
                Ok(descriptor.explanation(&step.values))
            })
            .collect()
    }
}

/// Raw step configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub action: String,

    /// Raw values, validated against the action's properties on compile
    #[serde(default)]
    pub values: Vec<String>,
}

/// Raw flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Unique ID (optional, auto-generated if not provided)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, alias = "trigger")]
    pub triggers: Vec<Trigger>,

    #[serde(default, alias = "action")]
    pub actions: Vec<StepConfig>,
}

impl FlowConfig {
    /// Validate the configuration and build a flow definition
    pub fn compile(
        &self,
        catalog: &ActionCatalog,
        guild: GuildId,
        directory: &dyn GuildDirectory,
    ) -> FlowResult<FlowDefinition> {
        let steps = self
            .actions
            .iter()
            .enumerate()
            .map(|(step, config)| compile_step(step, config, catalog, guild, directory))
            .collect::<FlowResult<Vec<_>>>()?;

        let flow = FlowDefinition {
            id: self
                .id
                .clone()
                .unwrap_or_else(|| ulid::Ulid::new().to_string()),
            name: self.name.clone(),
            enabled: self.enabled,
            triggers: self.triggers.clone(),
            steps,
        };
        debug!(flow = %flow.display_name(), steps = flow.steps.len(), "Compiled flow");
        Ok(flow)
    }
}

fn compile_step(
    step: usize,
    config: &StepConfig,
    catalog: &ActionCatalog,
    guild: GuildId,
    directory: &dyn GuildDirectory,
) -> FlowResult<FlowStep> {
    let descriptor = catalog
        .resolve(&config.action)
        .map_err(|error| error.at_step(step))?;

    if config.values.len() != descriptor.arity() {
        return Err(FlowError::ArityMismatch {
            step,
            key: config.action.clone(),
            expected: descriptor.arity(),
            got: config.values.len(),
        });
    }

    let values = descriptor
        .properties
        .iter()
        .zip(&config.values)
        .map(|(property, raw)| {
            property
                .validate(raw, guild, directory)
                .map_err(|source| FlowError::Validation { step, source })
        })
        .collect::<FlowResult<Vec<_>>>()?;

    Ok(FlowStep::new(descriptor.key, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyKind, ValidationError};
    use countr_core::{Channel, ChannelId, ChannelKind, Role, RoleId};
    use countr_platform::{GuildSnapshot, RecordingPlatform};
    use serde_json::json;

    const GUILD: GuildId = GuildId::new(1);

    fn directory() -> RecordingPlatform {
        RecordingPlatform::new(
            GuildSnapshot::new(GUILD)
                .with_role(Role::new(RoleId::new(10), "Counter"))
                .with_channel(Channel::new(ChannelId::new(20), "counting", ChannelKind::Text)),
        )
    }

    fn config(value: serde_json::Value) -> FlowConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_compile() {
        let flow = config(json!({
            "id": "milestone",
            "triggers": [{"type": "each", "number": 100}],
            "actions": [
                {"action": "giverole", "values": ["Counter"]},
                {"action": "sendmessage", "values": ["#counting", "{count}!"]},
                {"action": "pin"}
            ]
        }))
        .compile(&ActionCatalog::builtin(), GUILD, &directory())
        .unwrap();

        assert_eq!(flow.id, "milestone");
        assert!(flow.enabled);
        assert_eq!(
            flow.steps,
            vec![
                FlowStep::new("giverole", vec![PropertyValue::Role(RoleId::new(10))]),
                FlowStep::new(
                    "sendmessage",
                    vec![
                        PropertyValue::Channel(ChannelId::new(20)),
                        PropertyValue::Text("{count}!".into())
                    ]
                ),
                FlowStep::bare("pin"),
            ]
        );
    }

    #[test]
    fn test_compile_generates_id() {
        let flow = config(json!({"actions": []}))
            .compile(&ActionCatalog::builtin(), GUILD, &directory())
            .unwrap();
        assert_eq!(flow.id.len(), 26);
        assert_eq!(flow.display_name(), flow.id);
    }

    #[test]
    fn test_compile_unknown_action() {
        let err = config(json!({
            "actions": [{"action": "pin"}, {"action": "explode"}]
        }))
        .compile(&ActionCatalog::builtin(), GUILD, &directory())
        .unwrap_err();
        assert_eq!(
            err,
            FlowError::UnknownAction {
                step: 1,
                key: "explode".into()
            }
        );
    }

    #[test]
    fn test_compile_arity() {
        let err = config(json!({
            "actions": [{"action": "sendmessage", "values": ["#counting"]}]
        }))
        .compile(&ActionCatalog::builtin(), GUILD, &directory())
        .unwrap_err();
        assert_eq!(
            err,
            FlowError::ArityMismatch {
                step: 0,
                key: "sendmessage".into(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_compile_invalid_reference() {
        let err = config(json!({
            "actions": [{"action": "takerole", "values": ["Admins"]}]
        }))
        .compile(&ActionCatalog::builtin(), GUILD, &directory())
        .unwrap_err();
        assert_eq!(
            err,
            FlowError::Validation {
                step: 0,
                source: ValidationError::InvalidReference {
                    kind: PropertyKind::Role,
                    raw: "Admins".into()
                }
            }
        );
    }

    #[test]
    fn test_explain() {
        let flow = FlowDefinition::new(
            vec![Trigger::CountFail],
            vec![FlowStep::bare("lock"), FlowStep::bare("reset")],
        );
        assert_eq!(
            flow.explain(&ActionCatalog::builtin()).unwrap(),
            vec!["Lock the counting channel", "Reset the count to 0"]
        );

        let broken = FlowDefinition::new(vec![], vec![FlowStep::bare("giverole")]);
        assert!(matches!(
            broken.explain(&ActionCatalog::builtin()),
            Err(FlowError::ArityMismatch { step: 0, .. })
        ));
    }

    #[test]
    fn test_resolve_checks_kinds() {
        let catalog = ActionCatalog::builtin();
        let step = FlowStep::new("giverole", vec![PropertyValue::Text("10".into())]);
        assert_eq!(
            step.resolve(3, &catalog).unwrap_err(),
            FlowError::PropertyMismatch {
                step: 3,
                key: "giverole".into(),
                index: 0,
                expected: PropertyKind::Role
            }
        );

        let step = FlowStep::new("giverole", vec![PropertyValue::Role(RoleId::new(10))]);
        assert_eq!(step.resolve(0, &catalog).unwrap().key, "giverole");
    }

    #[test]
    fn test_disabled_flow_never_triggers() {
        let mut flow = FlowDefinition::new(vec![Trigger::CountFail], vec![]);
        let event = CountingEvent::CountFailed { count: 3, score: 0 };
        assert!(flow.is_triggered_by(&event));
        flow.enabled = false;
        assert!(!flow.is_triggered_by(&event));
    }
}
