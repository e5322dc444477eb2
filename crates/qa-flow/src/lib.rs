#![allow(missing_docs)]

pub mod animation;
pub mod controller;
pub mod error;
pub mod history;
pub mod options;
pub mod presentation;
pub mod preset;
pub mod registry;

pub use animation::{AnimationConfig, AnimationCoordinator, AnimationPhase, Direction};
pub use controller::{NavigationOutcome, QuestionnaireController};
pub use error::{CompletionError, FlowError, FlowResult, RegistryError};
pub use history::StepHistory;
pub use options::{GateContext, QuestionnaireHooks, QuestionnaireOptions, StepChange};
pub use presentation::{
    PresentationShell, PresentationSnapshot, RenderedStep, StepActions, render_step,
};
pub use preset::{AnimationPreset, ChannelBundle, Transform};
pub use registry::{ComponentRegistry, QuestionProps, QuestionRenderer};
