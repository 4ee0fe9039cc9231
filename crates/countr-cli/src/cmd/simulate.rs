//! `countr simulate`: dry-run a counting event
//!
//! Flows run against a [`RecordingPlatform`] built from the configured guild,
//! so nothing leaves the process. The recorded calls are printed afterwards.

use anyhow::{bail, Context, Result};
use countr_core::{ChannelId, Message, MessageId, User, UserId};
use countr_flows::{
    CountingContext, CountingEvent, FlowDispatcher, FlowExecutor, SharedActionCatalog,
};
use countr_platform::{GuildDirectory, PlatformCall, RecordingPlatform};
use countr_store::CountState;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::config::BotConfig;

/// Id given to the simulated user message
const SIMULATED_MESSAGE: MessageId = MessageId::new(1 << 41);

/// Parameters of a simulated event
#[derive(Debug, Clone)]
pub struct Simulation {
    pub channel: ChannelId,
    pub user: UserId,
    /// Count to report; defaults to the next count (or the current one on failure)
    pub count: Option<u64>,
    /// Score to report; defaults to the user's stored score after counting
    pub score: Option<u64>,
    /// Simulate a wrong number instead of a correct one
    pub fail: bool,
    /// Message text; defaults to the count
    pub content: Option<String>,
}

pub async fn run(
    config: &BotConfig,
    catalog: SharedActionCatalog,
    simulation: &Simulation,
    out: &mut impl Write,
) -> Result<()> {
    let guild = config.guild.id;
    let channel = simulation.channel;
    let platform = Arc::new(RecordingPlatform::new(config.guild.clone()));

    let compiled = config.compile(&catalog, platform.as_ref());
    if !compiled.issues.is_empty() {
        bail!(
            "{} flow(s) failed to compile, run `countr check` for details",
            compiled.issues.len()
        );
    }

    let store = Arc::new(config.store());
    let current = store
        .count(channel)
        .with_context(|| format!("{} is not a counting channel", channel.mention()))?;

    let member = config
        .guild
        .members
        .iter()
        .find(|m| m.user.id == simulation.user)
        .cloned();
    let author = member
        .as_ref()
        .map(|m| m.user.clone())
        .unwrap_or_else(|| User::new(simulation.user, format!("user-{}", simulation.user)));

    let (event, count, score) = if simulation.fail {
        let count = simulation.count.unwrap_or(current);
        let score = simulation
            .score
            .unwrap_or_else(|| store.score(channel, simulation.user));
        (CountingEvent::CountFailed { count, score }, count, score)
    } else {
        let count = simulation.count.unwrap_or(current.saturating_add(1));
        store.set_count(
            channel,
            CountState::new(count).counted_by(simulation.user, SIMULATED_MESSAGE),
        );
        let stored = store.add_score(channel, simulation.user, 1).unwrap_or(1);
        let score = simulation.score.unwrap_or(stored);
        (CountingEvent::Counted { count, score }, count, score)
    };

    let kind = platform
        .channel(guild, channel)
        .map(|c| c.kind)
        .unwrap_or_default();
    let mut message = Message::new(SIMULATED_MESSAGE, channel, author.clone())
        .in_guild(guild)
        .with_channel_kind(kind)
        .with_content(
            simulation
                .content
                .clone()
                .unwrap_or_else(|| count.to_string()),
        );
    if let Some(member) = member {
        message = message.with_member(member);
    }
    let ctx = CountingContext::for_message(count, score, message, store.clone());

    let dispatcher = FlowDispatcher::new(FlowExecutor::new(catalog, platform.clone()));
    if let Some(flows) = compiled.flows.get(&channel) {
        dispatcher.set_flows(channel, flows.clone());
    }

    info!(channel = %channel, ?event, "Simulating counting event");
    let report = dispatcher.dispatch(event, &ctx).await?;

    let verb = if simulation.fail { "failed at" } else { "counted" };
    writeln!(
        out,
        "{} {} {} (score {}) in {}",
        author.tag(),
        verb,
        count,
        score,
        channel.mention()
    )?;

    if report.is_empty() {
        writeln!(out, "no flow triggered")?;
    }
    for (id, flow_report) in &report.flows {
        let name = compiled
            .flows
            .get(&channel)
            .and_then(|flows| flows.iter().find(|f| &f.id == id))
            .map(|f| f.display_name().to_string())
            .unwrap_or_else(|| id.clone());
        writeln!(
            out,
            "flow {}: {} step(s), {} ignored failure(s)",
            name,
            flow_report.steps.len(),
            flow_report.ignored()
        )?;
    }

    let calls = platform.calls();
    if !calls.is_empty() {
        writeln!(out, "calls:")?;
        for call in &calls {
            writeln!(out, "  {}", describe(call))?;
        }
    }
    writeln!(out, "reset: {}", if report.reset { "yes" } else { "no" })?;
    if let Some(count) = store.count(channel) {
        writeln!(out, "count: {}", count)?;
    }
    Ok(())
}

fn describe(call: &PlatformCall) -> String {
    match call {
        PlatformCall::AddRole { user, role } => {
            format!("add {} to {}", role.mention(), user.mention())
        }
        PlatformCall::RemoveRole { user, role } => {
            format!("remove {} from {}", role.mention(), user.mention())
        }
        PlatformCall::SendMessage { channel, message } => {
            format!("send to {}: {}", channel.mention(), message.content)
        }
        PlatformCall::Pin(message) => format!("pin message {}", message.message_id),
        PlatformCall::Unpin(message) => format!("unpin message {}", message.message_id),
        PlatformCall::FetchPinned(channel) => format!("fetch pins of {}", channel.mention()),
        PlatformCall::EditOverwrite {
            channel,
            role,
            overwrite,
        } => {
            let target = format!("{} in {}", role.mention(), channel.mention());
            match overwrite.send_messages {
                Some(false) => format!("deny send messages for {}", target),
                Some(true) => format!("allow send messages for {}", target),
                None => format!("reset overwrite for {}", target),
            }
        }
    }
}
