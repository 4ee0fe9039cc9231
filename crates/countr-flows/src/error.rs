//! Error types for flow compilation and execution

use thiserror::Error;

use crate::property::ValidationError;

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Configuration-integrity faults. Platform failures never surface here;
/// actions absorb them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A step names an action the catalog does not know
    #[error("step {step}: unknown action '{key}'")]
    UnknownAction { step: usize, key: String },

    /// A step binds the wrong number of values for its action
    #[error("step {step}: action '{key}' takes {expected} value(s), got {got}")]
    ArityMismatch {
        step: usize,
        key: String,
        expected: usize,
        got: usize,
    },

    /// A bound value has the wrong property kind for its slot
    #[error("step {step}: value {index} of action '{key}' must be a {expected}")]
    PropertyMismatch {
        step: usize,
        key: String,
        index: usize,
        expected: crate::property::PropertyKind,
    },

    /// A raw configuration value failed validation
    #[error("step {step}: {source}")]
    Validation {
        step: usize,
        #[source]
        source: ValidationError,
    },
}

impl FlowError {
    /// Step position the error refers to
    pub fn step(&self) -> usize {
        match self {
            Self::UnknownAction { step, .. }
            | Self::ArityMismatch { step, .. }
            | Self::PropertyMismatch { step, .. }
            | Self::Validation { step, .. } => *step,
        }
    }

    /// Attach the error to the step at `index`
    pub fn at_step(mut self, index: usize) -> Self {
        match &mut self {
            Self::UnknownAction { step, .. }
            | Self::ArityMismatch { step, .. }
            | Self::PropertyMismatch { step, .. }
            | Self::Validation { step, .. } => *step = index,
        }
        self
    }
}
