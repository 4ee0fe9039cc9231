//! Flow engine for countr
//!
//! Server admins attach flows to counting channels. A flow fires on counting
//! events and runs an ordered list of actions against the chat platform.
//!
//! # Architecture
//!
//! ```text
//! FLOW = TRIGGERS → STEPS (action key + bound property values)
//! ```
//!
//! - **Property types** validate raw configuration into typed values
//! - **Actions** are catalog entries with a best-effort handler
//! - **Executor** resolves every step first, then runs them in order
//! - **Dispatcher** picks the flows a counting event triggers
//!
//! Platform failures never escape an action. They are recorded as
//! [`Outcome::Ignored`] in the action's report. The only errors are
//! configuration faults ([`FlowError`]), and those abort a flow before it has
//! any effect.
//!
//! # Key Types
//!
//! - [`ActionCatalog`] - Registry of available actions
//! - [`FlowDefinition`] - Triggers plus validated steps
//! - [`CountingContext`] - Per-event data handed to every action
//! - [`FlowExecutor`] - Runs steps and aggregates the reset signal
//! - [`FlowDispatcher`] - Per-channel flows and event dispatch

pub mod action;
pub mod actions;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod flow;
pub mod outcome;
pub mod property;
pub mod trigger;

pub use action::{
    ActionCatalog, ActionDescriptor, ActionHandler, Explanation, SharedActionCatalog,
};
pub use actions::render_placeholders;
pub use context::CountingContext;
pub use dispatch::{DispatchReport, FlowDispatcher};
pub use error::{FlowError, FlowResult};
pub use executor::{FlowExecutor, FlowReport, StepReport};
pub use flow::{FlowConfig, FlowDefinition, FlowStep, StepConfig};
pub use outcome::{ActionReport, Outcome};
pub use property::{PropertyKind, PropertyType, PropertyValue, ValidationError};
pub use trigger::{CountingEvent, Trigger};
