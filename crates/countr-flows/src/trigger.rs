//! Flow triggers
//!
//! Triggers decide which flows run for a counting event. A flow runs when any
//! of its triggers matches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A counting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountingEvent {
    /// A correct number was posted
    Counted { count: u64, score: u64 },

    /// An incorrect number was posted
    CountFailed { count: u64, score: u64 },
}

impl CountingEvent {
    pub fn count(&self) -> u64 {
        match self {
            CountingEvent::Counted { count, .. } | CountingEvent::CountFailed { count, .. } => {
                *count
            }
        }
    }

    pub fn score(&self) -> u64 {
        match self {
            CountingEvent::Counted { score, .. } | CountingEvent::CountFailed { score, .. } => {
                *score
            }
        }
    }
}

/// Condition under which a flow fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Every positive multiple of `number` (e.g. every 100th count)
    Each { number: u64 },

    /// Exactly the count `number`
    Only { number: u64 },

    /// The counting user's score reaches `number`
    Score { number: u64 },

    /// Someone posted a wrong number
    CountFail,
}

impl Trigger {
    /// Whether the trigger fires for an event
    pub fn matches(&self, event: &CountingEvent) -> bool {
        match (self, event) {
            (Trigger::Each { number }, CountingEvent::Counted { count, .. }) => {
                *number > 0 && *count > 0 && count % number == 0
            }
            (Trigger::Only { number }, CountingEvent::Counted { count, .. }) => count == number,
            (Trigger::Score { number }, CountingEvent::Counted { score, .. }) => score == number,
            (Trigger::CountFail, CountingEvent::CountFailed { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Each { number } => write!(f, "Every {} numbers", number),
            Trigger::Only { number } => write!(f, "When someone counts {}", number),
            Trigger::Score { number } => write!(f, "When someone reaches a score of {}", number),
            Trigger::CountFail => write!(f, "When someone fails a count"),
        }
    }
}
