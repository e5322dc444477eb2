use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use qa_spec::FormValues;
use serde::Serialize;

use crate::animation::{AnimationConfig, Direction};
use crate::error::CompletionError;

pub(crate) type CompleteFn =
    Arc<dyn Fn(FormValues) -> BoxFuture<'static, Result<(), CompletionError>> + Send + Sync>;
pub(crate) type GateFn = Arc<dyn Fn(GateContext) -> BoxFuture<'static, bool> + Send + Sync>;
pub(crate) type StepChangeFn = Arc<dyn Fn(StepChange) + Send + Sync>;
pub(crate) type ExitFn = Arc<dyn Fn() + Send + Sync>;

/// What a gate callback sees before deciding on a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct GateContext {
    pub index: usize,
    pub total_steps: usize,
    pub direction: Direction,
    pub values: FormValues,
}

/// Reported after the active step changed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct StepChange {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
}

/// Construction-time settings for a questionnaire session.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionnaireOptions {
    pub initial_index: usize,
    pub initial_values: FormValues,
    /// Navigation logs at `info` instead of `debug`.
    pub verbose: bool,
    pub animation: AnimationConfig,
}

impl Default for QuestionnaireOptions {
    fn default() -> Self {
        Self {
            initial_index: 0,
            initial_values: FormValues::new(),
            verbose: false,
            animation: AnimationConfig::default(),
        }
    }
}

impl QuestionnaireOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_index(mut self, index: usize) -> Self {
        self.initial_index = index;
        self
    }

    pub fn initial_values(mut self, values: FormValues) -> Self {
        self.initial_values = values;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }
}

/// Caller-supplied callbacks. All of them are optional.
#[derive(Clone, Default)]
pub struct QuestionnaireHooks {
    pub(crate) on_complete: Option<CompleteFn>,
    pub(crate) on_step_change: Option<StepChangeFn>,
    pub(crate) before_advance: Option<GateFn>,
    pub(crate) before_retreat: Option<GateFn>,
    pub(crate) on_exit: Option<ExitFn>,
}

impl QuestionnaireHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receives the full value map when the last step is submitted.
    pub fn on_complete<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CompletionError>> + Send + 'static,
    {
        self.on_complete = Some(Arc::new(move |values: FormValues| callback(values).boxed()));
        self
    }

    pub fn on_step_change(mut self, callback: impl Fn(StepChange) + Send + Sync + 'static) -> Self {
        self.on_step_change = Some(Arc::new(callback));
        self
    }

    /// Resolving to `false` cancels the advance or skip.
    pub fn before_advance<F, Fut>(mut self, gate: F) -> Self
    where
        F: Fn(GateContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.before_advance = Some(Arc::new(move |ctx: GateContext| gate(ctx).boxed()));
        self
    }

    /// Resolving to `false` cancels the retreat.
    pub fn before_retreat<F, Fut>(mut self, gate: F) -> Self
    where
        F: Fn(GateContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.before_retreat = Some(Arc::new(move |ctx: GateContext| gate(ctx).boxed()));
        self
    }

    /// Called when the user backs out of the first step.
    pub fn on_exit(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_exit = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for QuestionnaireHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionnaireHooks")
            .field("on_complete", &self.on_complete.is_some())
            .field("on_step_change", &self.on_step_change.is_some())
            .field("before_advance", &self.before_advance.is_some())
            .field("before_retreat", &self.before_retreat.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}
