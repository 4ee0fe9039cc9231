//! Command-line tooling for countr flow configurations
//!
//! - `countr actions` lists the action catalog
//! - `countr check <config>` compiles every flow and explains it
//! - `countr simulate <config> ...` dry-runs a counting event

pub mod cmd;
pub mod config;

pub use config::{BotConfig, ChannelConfig, CompiledFlows, FlowIssue};
