//! Flow executor
//!
//! Runs a flow's steps against the platform. Every step is resolved against
//! the catalog before anything runs, so a flow with an unknown action or a
//! malformed binding has no side effects at all. Handlers then run strictly in
//! declared order, each awaited before the next starts.

use countr_platform::Platform;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use ulid::Ulid;

use crate::action::{ActionDescriptor, SharedActionCatalog};
use crate::context::CountingContext;
use crate::error::FlowResult;
use crate::flow::FlowStep;
use crate::outcome::ActionReport;

/// Report of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Action key of the step
    pub action: &'static str,

    pub report: ActionReport,
}

/// Report of one flow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    /// Unique id of the run
    pub run_id: String,

    /// Step reports, in execution order
    pub steps: Vec<StepReport>,
}

impl FlowReport {
    /// Whether any step asked for the count to be reset
    pub fn reset(&self) -> bool {
        self.steps.iter().any(|s| s.report.reset)
    }

    /// Number of platform failures discarded across all steps
    pub fn ignored(&self) -> usize {
        self.steps.iter().map(|s| s.report.ignored()).sum()
    }
}

/// Flow executor
///
/// Holds the action catalog and the platform handlers talk to.
pub struct FlowExecutor {
    catalog: SharedActionCatalog,
    platform: Arc<dyn Platform>,
}

impl FlowExecutor {
    pub fn new(catalog: SharedActionCatalog, platform: Arc<dyn Platform>) -> Self {
        Self { catalog, platform }
    }

    pub fn catalog(&self) -> &SharedActionCatalog {
        &self.catalog
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Run `steps` in order and aggregate their reports.
    ///
    /// Fails only on configuration faults, before any step runs.
    #[instrument(
        skip_all,
        fields(run_id = tracing::field::Empty, channel = %ctx.channel_id(), steps = steps.len())
    )]
    pub async fn run_flow(
        &self,
        ctx: &CountingContext,
        steps: &[FlowStep],
    ) -> FlowResult<FlowReport> {
        let resolved = self.resolve(steps)?;

        let run_id = Ulid::new().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let mut reports = Vec::with_capacity(resolved.len());
        for (index, (descriptor, step)) in resolved.into_iter().zip(steps).enumerate() {
            debug!(step = index, action = descriptor.key, "Executing step");
            let report = descriptor
                .run(self.platform.as_ref(), ctx, &step.values)
                .await;
            if report.reset {
                debug!(step = index, action = descriptor.key, "Step requested reset");
            }
            reports.push(StepReport {
                action: descriptor.key,
                report,
            });
        }

        Ok(FlowReport {
            run_id,
            steps: reports,
        })
    }

    fn resolve(&self, steps: &[FlowStep]) -> FlowResult<Vec<&ActionDescriptor>> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| step.resolve(index, &self.catalog))
            .collect::<FlowResult<Vec<_>>>()
            .map_err(|error| {
                warn!(error = %error, "Refusing to run flow");
                error
            })
    }
}
