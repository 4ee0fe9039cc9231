//! Action descriptors and the action catalog
//!
//! Every action a flow can run is described by an [`ActionDescriptor`]: its
//! key, human-readable summary, declared properties, an explanation formatter
//! and a handler. The [`ActionCatalog`] maps keys to descriptors.

use async_trait::async_trait;
use countr_platform::Platform;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::context::CountingContext;
use crate::error::{FlowError, FlowResult};
use crate::outcome::ActionReport;
use crate::property::{PropertyType, PropertyValue};

/// Formats a preview of an action with its bound values.
///
/// Must be pure and total: a short `values` slice renders missing values as
/// empty text.
pub type Explanation = fn(&[PropertyValue]) -> String;

/// Executable part of an action
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action. Platform failures are absorbed into the report's
    /// outcomes; `values` matches the declared properties.
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        values: &[PropertyValue],
    ) -> ActionReport;
}

/// One available action
#[derive(Clone)]
pub struct ActionDescriptor {
    /// Catalog key (e.g. "giverole")
    pub key: &'static str,

    /// Short summary
    pub short: &'static str,

    /// Longer description
    pub long: Option<&'static str>,

    /// Declared properties, in binding order
    pub properties: &'static [PropertyType],

    explanation: Explanation,
    handler: Arc<dyn ActionHandler>,
}

impl ActionDescriptor {
    pub fn new(
        key: &'static str,
        short: &'static str,
        properties: &'static [PropertyType],
        explanation: Explanation,
        handler: impl ActionHandler + 'static,
    ) -> Self {
        Self {
            key,
            short,
            long: None,
            properties,
            explanation,
            handler: Arc::new(handler),
        }
    }

    pub fn with_long(mut self, long: &'static str) -> Self {
        self.long = Some(long);
        self
    }

    /// Number of values the action binds
    pub fn arity(&self) -> usize {
        self.properties.len()
    }

    /// Whether `values` has the declared count and kinds
    pub fn accepts(&self, values: &[PropertyValue]) -> bool {
        values.len() == self.properties.len()
            && self
                .properties
                .iter()
                .zip(values)
                .all(|(property, value)| property.accepts(value))
    }

    /// User-facing preview of the action with bound values
    pub fn explanation(&self, values: &[PropertyValue]) -> String {
        (self.explanation)(values)
    }

    /// Run the handler
    pub async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        values: &[PropertyValue],
    ) -> ActionReport {
        debug!(action = self.key, values = values.len(), "Running action");
        self.handler.run(platform, ctx, values).await
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("key", &self.key)
            .field("short", &self.short)
            .field("long", &self.long)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Registry of available actions, in registration order
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: IndexMap<&'static str, ActionDescriptor>,
}

impl ActionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in action
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for descriptor in crate::actions::builtin() {
            catalog.register(descriptor);
        }
        catalog
    }

    /// Register an action, returning the descriptor it replaced
    pub fn register(&mut self, descriptor: ActionDescriptor) -> Option<ActionDescriptor> {
        debug!(action = descriptor.key, "Registering action");
        self.actions.insert(descriptor.key, descriptor)
    }

    /// Look up an action by key
    pub fn get(&self, key: &str) -> Option<&ActionDescriptor> {
        self.actions.get(key)
    }

    /// Look up an action by key, failing with [`FlowError::UnknownAction`].
    ///
    /// The error refers to step 0; callers resolving a flow step rebind it
    /// with [`FlowError::at_step`].
    pub fn resolve(&self, key: &str) -> FlowResult<&ActionDescriptor> {
        self.get(key).ok_or_else(|| FlowError::UnknownAction {
            step: 0,
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    /// All actions, in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.values()
    }

    /// All keys, in registration order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Thread-safe handle to a catalog
pub type SharedActionCatalog = Arc<ActionCatalog>;

#[cfg(test)]
mod tests {
    use super::*;
    use countr_core::{ChannelId, RoleId};

    #[test]
    fn test_builtin_keys_in_order() {
        let catalog = ActionCatalog::builtin();
        let keys: Vec<_> = catalog.keys().collect();
        assert_eq!(
            keys,
            vec!["giverole", "takerole", "prunerole", "pin", "sendmessage", "lock", "reset"]
        );
        assert!(catalog.get("teleport").is_none());
    }

    #[test]
    fn test_explanations() {
        let catalog = ActionCatalog::builtin();
        let role = PropertyValue::Role(RoleId::new(10));

        assert_eq!(
            catalog.get("giverole").unwrap().explanation(&[role.clone()]),
            "Add the user to <@&10>"
        );
        assert_eq!(
            catalog.get("takerole").unwrap().explanation(&[role.clone()]),
            "Remove the user from <@&10>"
        );
        assert_eq!(
            catalog.get("prunerole").unwrap().explanation(&[role]),
            "Remove everyone from <@&10>"
        );
        assert_eq!(catalog.get("pin").unwrap().explanation(&[]), "Pin the count");
        assert_eq!(
            catalog.get("sendmessage").unwrap().explanation(&[
                PropertyValue::Channel(ChannelId::new(20)),
                PropertyValue::Text("{count}!".into()),
            ]),
            "Send a message in <#20>: ```{count}!```"
        );
        assert_eq!(
            catalog.get("lock").unwrap().explanation(&[]),
            "Lock the counting channel"
        );
        assert_eq!(
            catalog.get("reset").unwrap().explanation(&[]),
            "Reset the count to 0"
        );
    }

    #[test]
    fn test_resolve() {
        let catalog = ActionCatalog::builtin();
        assert_eq!(catalog.resolve("reset").unwrap().key, "reset");
        assert_eq!(
            catalog.resolve("teleport").unwrap_err(),
            FlowError::UnknownAction {
                step: 0,
                key: "teleport".into()
            }
        );
        assert_eq!(catalog.resolve("teleport").unwrap_err().at_step(3).step(), 3);
    }

    #[test]
    fn test_explanation_with_missing_values() {
        let catalog = ActionCatalog::builtin();
        assert_eq!(catalog.get("giverole").unwrap().explanation(&[]), "Add the user to ");
        assert_eq!(
            catalog.get("sendmessage").unwrap().explanation(&[]),
            "Send a message in : ``````"
        );
    }

    #[test]
    fn test_explanation_is_deterministic() {
        let catalog = ActionCatalog::builtin();
        let values = [
            PropertyValue::Channel(ChannelId::new(20)),
            PropertyValue::Text("hi {mention}".into()),
        ];
        let descriptor = catalog.get("sendmessage").unwrap();
        assert_eq!(descriptor.explanation(&values), descriptor.explanation(&values));
    }

    #[test]
    fn test_accepts() {
        let catalog = ActionCatalog::builtin();
        let sendmessage = catalog.get("sendmessage").unwrap();
        assert_eq!(sendmessage.arity(), 2);
        assert!(sendmessage.accepts(&[
            PropertyValue::Channel(ChannelId::new(20)),
            PropertyValue::Text("hi".into()),
        ]));
        // Wrong order
        assert!(!sendmessage.accepts(&[
            PropertyValue::Text("hi".into()),
            PropertyValue::Channel(ChannelId::new(20)),
        ]));
        assert!(!sendmessage.accepts(&[PropertyValue::Channel(ChannelId::new(20))]));
        assert!(catalog.get("reset").unwrap().accepts(&[]));
    }

    #[test]
    fn test_register_replaces() {
        let mut catalog = ActionCatalog::builtin();
        let len = catalog.len();
        let pin = catalog.get("pin").unwrap().clone().with_long("Pins it");
        let replaced = catalog.register(pin);
        assert!(replaced.is_some());
        assert_eq!(catalog.len(), len);
        assert_eq!(catalog.get("pin").unwrap().long, Some("Pins it"));
    }
}
