use thiserror::Error;

use crate::animation::AnimationPhase;

/// Failures surfaced by the questionnaire controller itself.
///
/// Validation failures and gate rejections are navigation outcomes, not
/// errors; see [`crate::NavigationOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("questionnaire state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("step configuration has no steps")]
    EmptyConfig,
    /// The configuration failed its structural checks; carries the reason.
    #[error("invalid step configuration: {0}")]
    InvalidConfig(String),
    #[error("a step transition is already in flight")]
    TransitionInFlight,
    #[error("step {index} is out of range (total {total})")]
    StepOutOfRange { index: usize, total: usize },
    #[error("invalid animation phase transition: {from:?} -> {to:?}")]
    InvalidPhase {
        from: AnimationPhase,
        to: AnimationPhase,
    },
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Raised by the component registry for a type tag nobody registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no renderer registered for question type '{0}'")]
    UnregisteredType(String),
}

/// Fault reported by a completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompletionError {
    pub message: String,
}

impl CompletionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
