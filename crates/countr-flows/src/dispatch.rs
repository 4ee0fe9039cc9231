//! Flow dispatch
//!
//! Keeps the flows of every counting channel and runs the ones whose triggers
//! match a counting event.

use countr_core::ChannelId;
use dashmap::DashMap;
use tracing::{debug, info, instrument};

use crate::context::CountingContext;
use crate::error::FlowResult;
use crate::executor::{FlowExecutor, FlowReport};
use crate::flow::FlowDefinition;
use crate::trigger::CountingEvent;

/// Result of dispatching one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Reports of the flows that ran, by flow id, in run order
    pub flows: Vec<(String, FlowReport)>,

    /// Whether any flow asked for the count to be reset
    pub reset: bool,
}

impl DispatchReport {
    /// Whether no flow matched the event
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Per-channel flow table in front of an executor
pub struct FlowDispatcher {
    executor: FlowExecutor,
    flows: DashMap<ChannelId, Vec<FlowDefinition>>,
}

impl FlowDispatcher {
    pub fn new(executor: FlowExecutor) -> Self {
        Self {
            executor,
            flows: DashMap::new(),
        }
    }

    pub fn executor(&self) -> &FlowExecutor {
        &self.executor
    }

    /// Replace every flow of a channel
    pub fn set_flows(&self, channel: ChannelId, flows: Vec<FlowDefinition>) {
        debug!(channel = %channel, flows = flows.len(), "Setting channel flows");
        if flows.is_empty() {
            self.flows.remove(&channel);
        } else {
            self.flows.insert(channel, flows);
        }
    }

    /// Add a flow to a channel, replacing any flow with the same id
    pub fn add_flow(&self, channel: ChannelId, flow: FlowDefinition) {
        let mut flows = self.flows.entry(channel).or_default();
        match flows.iter_mut().find(|f| f.id == flow.id) {
            Some(existing) => *existing = flow,
            None => flows.push(flow),
        }
    }

    /// Remove a flow by id, returning it
    pub fn remove_flow(&self, channel: ChannelId, id: &str) -> Option<FlowDefinition> {
        let mut flows = self.flows.get_mut(&channel)?;
        let index = flows.iter().position(|f| f.id == id)?;
        Some(flows.remove(index))
    }

    /// Flows of a channel, in registration order
    pub fn flows(&self, channel: ChannelId) -> Vec<FlowDefinition> {
        self.flows
            .get(&channel)
            .map(|f| f.value().clone())
            .unwrap_or_default()
    }

    /// Run every enabled flow of the context's channel that the event
    /// triggers, one after another.
    ///
    /// A flow with a configuration fault stops the dispatch; flows that ran
    /// before it keep their effects.
    #[instrument(skip_all, fields(channel = %ctx.channel_id(), count = event.count()))]
    pub async fn dispatch(
        &self,
        event: CountingEvent,
        ctx: &CountingContext,
    ) -> FlowResult<DispatchReport> {
        // Clone out of the map so no shard lock is held across awaits
        let matching: Vec<FlowDefinition> = self
            .flows(ctx.channel_id())
            .into_iter()
            .filter(|flow| flow.is_triggered_by(&event))
            .collect();
        debug!(flows = matching.len(), "Matched flows");

        let mut report = DispatchReport::default();
        for flow in matching {
            let flow_report = self.executor.run_flow(ctx, &flow.steps).await?;
            if flow_report.reset() {
                info!(flow = %flow.display_name(), "Flow requested count reset");
                report.reset = true;
            }
            report.flows.push((flow.id, flow_report));
        }
        Ok(report)
    }
}
