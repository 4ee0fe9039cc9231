//! Best-effort outcomes of platform calls
//!
//! Actions never propagate platform failures. Every call an action makes is
//! classified as an [`Outcome`] instead, and the outcomes are returned in the
//! action's [`ActionReport`] so callers and tests can inspect what happened.

use countr_platform::{PlatformError, PlatformResult};
use tracing::debug;

/// What became of one platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The call succeeded
    Applied,

    /// The call failed and the failure was discarded
    Ignored(PlatformError),

    /// A precondition did not hold, so no call was made
    Skipped(&'static str),
}

impl Outcome {
    /// Classify a platform call result, discarding the error
    pub fn best_effort<T>(action: &str, result: PlatformResult<T>) -> Self {
        match result {
            Ok(_) => Outcome::Applied,
            Err(error) => {
                debug!(action, error = %error, "Ignoring platform failure");
                Outcome::Ignored(error)
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

/// Result of running one action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReport {
    /// Whether the action asks for the count to be reset
    pub reset: bool,

    /// Outcomes of the platform calls the action made, in order
    pub outcomes: Vec<Outcome>,
}

impl ActionReport {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            reset: false,
            outcomes,
        }
    }

    /// A report with a single outcome
    pub fn single(outcome: Outcome) -> Self {
        Self::new(vec![outcome])
    }

    /// Nothing was attempted
    pub fn skipped(reason: &'static str) -> Self {
        Self::single(Outcome::Skipped(reason))
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Number of platform failures that were discarded
    pub fn ignored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ignored()).count()
    }
}
