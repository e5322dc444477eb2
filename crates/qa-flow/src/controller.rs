use std::collections::BTreeSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures_timer::Delay;
use qa_spec::{ErrorMap, FormValues, Step, StepConfig, StepSchema};
use serde_json::Value;

use crate::animation::{AnimationCoordinator, AnimationPhase, Direction};
use crate::error::{FlowError, FlowResult};
use crate::history::StepHistory;
use crate::options::{GateContext, GateFn, QuestionnaireHooks, QuestionnaireOptions, StepChange};
use crate::preset::Transform;

/// Navigation events go to `info` for verbose sessions and `debug` otherwise.
macro_rules! nav_event {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// How a navigation request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    /// The active step failed validation; carries the published errors.
    Blocked(ErrorMap),
    /// A gate callback resolved to `false`.
    Cancelled,
    /// Another transition is still in flight.
    Busy,
    Submitted,
    /// The completion callback failed; the session stays usable.
    SubmitFailed(String),
    /// Retreat on the first step; the exit callback was notified.
    ExitRequested,
    Disposed,
}

impl NavigationOutcome {
    /// True when the active step changed.
    pub fn moved(&self) -> bool {
        matches!(
            self,
            NavigationOutcome::Advanced { .. } | NavigationOutcome::Retreated { .. }
        )
    }
}

pub(crate) struct QuestionnaireState {
    pub(crate) index: usize,
    pub(crate) values: FormValues,
    pub(crate) history: StepHistory,
    pub(crate) dirty: BTreeSet<String>,
    pub(crate) errors: ErrorMap,
    pub(crate) schema: StepSchema,
    pub(crate) submitting: bool,
    pub(crate) field_processing: bool,
    pub(crate) transitioning: bool,
    pub(crate) disposed: bool,
    pub(crate) animation: AnimationCoordinator,
}

impl QuestionnaireState {
    /// Runs after every change to the value map.
    fn values_changed(&mut self) {
        self.recompute_errors();
    }

    /// Runs after the active step index changed.
    fn step_activated(&mut self, index: usize, step: &Step) {
        self.index = index;
        self.schema = StepSchema::compile(step);
        self.recompute_errors();
    }

    /// Publishes current failures, restricted to dirty fields.
    fn recompute_errors(&mut self) {
        if self.dirty.is_empty() || self.schema.is_empty() {
            self.errors.clear();
            return;
        }
        let errors = self
            .schema
            .evaluate(&self.values)
            .into_errors()
            .into_iter()
            .filter(|(name, _)| self.dirty.contains(name))
            .collect();
        self.errors = errors;
    }
}

/// Releases the in-flight flag when a navigation finishes or its future is
/// dropped.
struct TransitionGuard {
    state: Arc<RwLock<QuestionnaireState>>,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.transitioning = false;
        state.submitting = false;
        if state.animation.phase() != AnimationPhase::Idle {
            state.animation.settle();
        }
    }
}

enum Admission {
    Granted(TransitionGuard),
    Refused(NavigationOutcome),
}

/// Step navigation and validation state machine for one questionnaire
/// session.
///
/// The handle is cheap to clone; clones share the same session, so a
/// presentation layer can keep editing fields while a navigation future is
/// suspended on a gate or an animation phase. At most one navigation runs at
/// a time, concurrent requests resolve to [`NavigationOutcome::Busy`].
#[derive(Clone)]
pub struct QuestionnaireController {
    pub(crate) config: Arc<StepConfig>,
    hooks: QuestionnaireHooks,
    verbose: bool,
    pub(crate) state: Arc<RwLock<QuestionnaireState>>,
}

impl fmt::Debug for QuestionnaireController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionnaireController")
            .field("total_steps", &self.config.len())
            .field("verbose", &self.verbose)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl QuestionnaireController {
    pub fn new(
        config: StepConfig,
        options: QuestionnaireOptions,
        hooks: QuestionnaireHooks,
    ) -> FlowResult<Self> {
        if config.is_empty() {
            return Err(FlowError::EmptyConfig);
        }
        config
            .check()
            .map_err(|err| FlowError::InvalidConfig(err.to_string()))?;
        let index = options.initial_index;
        let Some(step) = config.step(index) else {
            return Err(FlowError::StepOutOfRange {
                index,
                total: config.len(),
            });
        };

        let mut history = StepHistory::new();
        history.record(index, &options.initial_values);
        let schema = StepSchema::compile(step);

        let state = QuestionnaireState {
            index,
            values: options.initial_values,
            history,
            dirty: BTreeSet::new(),
            errors: ErrorMap::new(),
            schema,
            submitting: false,
            field_processing: false,
            transitioning: false,
            disposed: false,
            animation: AnimationCoordinator::new(options.animation),
        };
        nav_event!(
            options.verbose,
            total_steps = config.len(),
            index,
            "questionnaire session created"
        );

        Ok(Self {
            config: Arc::new(config),
            hooks,
            verbose: options.verbose,
            state: Arc::new(RwLock::new(state)),
        })
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn total_steps(&self) -> usize {
        self.config.len()
    }

    pub fn current_index(&self) -> FlowResult<usize> {
        Ok(read_lock(&self.state, "reading step index")?.index)
    }

    pub fn current_step(&self) -> FlowResult<Step> {
        let index = self.current_index()?;
        Ok(self.config.steps[index].clone())
    }

    pub fn values(&self) -> FlowResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn errors(&self) -> FlowResult<ErrorMap> {
        Ok(read_lock(&self.state, "reading errors")?.errors.clone())
    }

    pub fn dirty_fields(&self) -> FlowResult<BTreeSet<String>> {
        Ok(read_lock(&self.state, "reading dirty fields")?.dirty.clone())
    }

    /// Snapshot recorded for `index`, if the step was ever visited.
    pub fn history_snapshot(&self, index: usize) -> FlowResult<Option<FormValues>> {
        Ok(read_lock(&self.state, "reading step history")?
            .history
            .get(index)
            .cloned())
    }

    pub fn direction(&self) -> FlowResult<Direction> {
        Ok(read_lock(&self.state, "reading direction")?
            .animation
            .direction())
    }

    pub fn is_submitting(&self) -> FlowResult<bool> {
        Ok(read_lock(&self.state, "reading submit flag")?.submitting)
    }

    pub fn is_field_processing(&self) -> FlowResult<bool> {
        Ok(read_lock(&self.state, "reading processing flag")?.field_processing)
    }

    pub fn is_transitioning(&self) -> FlowResult<bool> {
        Ok(read_lock(&self.state, "reading transition flag")?.transitioning)
    }

    pub fn is_disposed(&self) -> FlowResult<bool> {
        Ok(read_lock(&self.state, "reading disposed flag")?.disposed)
    }

    pub fn has_skippable(&self) -> FlowResult<bool> {
        let index = self.current_index()?;
        Ok(self.config.steps[index].has_skippable())
    }

    pub fn animation_phase(&self) -> FlowResult<AnimationPhase> {
        Ok(read_lock(&self.state, "reading animation phase")?
            .animation
            .phase())
    }

    /// `(enter, exit)` preset identifiers.
    pub fn preset_ids(&self) -> FlowResult<(&'static str, &'static str)> {
        Ok(read_lock(&self.state, "reading presets")?
            .animation
            .preset_ids())
    }

    /// Transform of the step container at `now`.
    pub fn frame(&self, now: Instant) -> FlowResult<Transform> {
        Ok(read_lock(&self.state, "sampling animation frame")?
            .animation
            .frame(now))
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) -> FlowResult<()> {
        self.set_field_processing(name, value, false)
    }

    /// Stores a value and marks the field dirty. `processing` flags an
    /// operation still attached to the field, such as an upload.
    pub fn set_field_processing(
        &self,
        name: impl Into<String>,
        value: Value,
        processing: bool,
    ) -> FlowResult<()> {
        let name = name.into();
        let mut guard = write_lock(&self.state, "writing field value")?;
        let state = &mut *guard;
        if state.disposed {
            tracing::debug!(field = %name, "ignoring field update on disposed questionnaire");
            return Ok(());
        }
        state.values.insert(name.clone(), value);
        state.dirty.insert(name);
        state.history.record(state.index, &state.values);
        state.field_processing = processing;
        state.values_changed();
        Ok(())
    }

    /// Sets or clears the processing flag without touching any value.
    pub fn set_processing(&self, processing: bool) -> FlowResult<()> {
        write_lock(&self.state, "writing processing flag")?.field_processing = processing;
        Ok(())
    }

    /// Merges new initial values into the live map.
    pub fn merge_values(&self, values: FormValues) -> FlowResult<()> {
        let mut guard = write_lock(&self.state, "merging form values")?;
        let state = &mut *guard;
        if state.disposed {
            return Ok(());
        }
        state.values.extend(values);
        state.history.record(state.index, &state.values);
        state.values_changed();
        Ok(())
    }

    /// Marks every field of the active step dirty and publishes all of its
    /// failures. Returns whether the step is valid.
    pub fn validate_now(&self) -> FlowResult<bool> {
        let mut state = write_lock(&self.state, "validating active step")?;
        Ok(self.validate_active_step(&mut state))
    }

    /// Side-effect free readiness check for the active step.
    pub fn is_step_satisfied(&self) -> FlowResult<bool> {
        let state = read_lock(&self.state, "checking step readiness")?;
        Ok(self.step_satisfied(&state))
    }

    /// Moves straight to `index` without animation or history restore.
    /// Refused with [`FlowError::TransitionInFlight`] while a navigation is
    /// suspended.
    pub fn jump_to(&self, index: usize) -> FlowResult<()> {
        let Some(step) = self.config.step(index) else {
            return Err(FlowError::StepOutOfRange {
                index,
                total: self.config.len(),
            });
        };
        let mut state = write_lock(&self.state, "jumping to step")?;
        if state.disposed {
            return Ok(());
        }
        if state.transitioning {
            tracing::warn!(to = index, "jump rejected, a transition is already in flight");
            return Err(FlowError::TransitionInFlight);
        }
        let from = state.index;
        state.step_activated(index, step);
        nav_event!(self.verbose, from, to = index, "jumped to step");
        Ok(())
    }

    /// Validates the active step and moves forward, or submits on the last
    /// step.
    pub async fn advance(&self) -> FlowResult<NavigationOutcome> {
        self.forward("advance", true).await
    }

    /// Like [`QuestionnaireController::advance`] without validation. The
    /// advance gate still applies.
    pub async fn skip(&self) -> FlowResult<NavigationOutcome> {
        self.forward("skip", false).await
    }

    /// Moves back one step, or reports an exit intent on the first step.
    pub async fn retreat(&self) -> FlowResult<NavigationOutcome> {
        let _guard = match self.admit("retreat")? {
            Admission::Granted(guard) => guard,
            Admission::Refused(outcome) => return Ok(outcome),
        };
        let from = self.current_index()?;

        if from == 0 {
            nav_event!(self.verbose, "retreat on first step, requesting exit");
            if let Some(on_exit) = &self.hooks.on_exit {
                on_exit();
            }
            return Ok(NavigationOutcome::ExitRequested);
        }

        if let Some(outcome) = self
            .consult_gate(self.hooks.before_retreat.as_ref(), Direction::Backward)
            .await?
        {
            return Ok(outcome);
        }

        self.transition(from, from - 1, Direction::Backward).await
    }

    /// Tears the session down. Suspended navigations resolve to
    /// [`NavigationOutcome::Disposed`] without touching state.
    pub fn dispose(&self) -> FlowResult<()> {
        write_lock(&self.state, "disposing questionnaire")?.disposed = true;
        nav_event!(self.verbose, "questionnaire session disposed");
        Ok(())
    }

    async fn forward(&self, action: &'static str, validate: bool) -> FlowResult<NavigationOutcome> {
        let _guard = match self.admit(action)? {
            Admission::Granted(guard) => guard,
            Admission::Refused(outcome) => return Ok(outcome),
        };

        let from = {
            let mut state = write_lock(&self.state, "validating before advance")?;
            if validate && !self.validate_active_step(&mut state) {
                let errors = state.errors.clone();
                nav_event!(
                    self.verbose,
                    step = state.index,
                    failures = errors.len(),
                    "advance blocked by validation"
                );
                return Ok(NavigationOutcome::Blocked(errors));
            }
            state.index
        };

        if let Some(outcome) = self
            .consult_gate(self.hooks.before_advance.as_ref(), Direction::Forward)
            .await?
        {
            return Ok(outcome);
        }

        if from + 1 >= self.config.len() {
            return self.submit().await;
        }
        self.transition(from, from + 1, Direction::Forward).await
    }

    /// `Some` when the navigation must stop after the gate.
    async fn consult_gate(
        &self,
        gate: Option<&GateFn>,
        direction: Direction,
    ) -> FlowResult<Option<NavigationOutcome>> {
        let Some(gate) = gate else {
            return Ok(None);
        };
        let ctx = {
            let state = read_lock(&self.state, "preparing gate context")?;
            GateContext {
                index: state.index,
                total_steps: self.config.len(),
                direction,
                values: state.values.clone(),
            }
        };
        let index = ctx.index;
        if !gate(ctx).await {
            nav_event!(self.verbose, index, ?direction, "transition cancelled by gate");
            return Ok(Some(NavigationOutcome::Cancelled));
        }
        if self.is_disposed()? {
            return Ok(Some(NavigationOutcome::Disposed));
        }
        Ok(None)
    }

    async fn submit(&self) -> FlowResult<NavigationOutcome> {
        let values = {
            let mut state = write_lock(&self.state, "starting submit")?;
            state.submitting = true;
            state.values.clone()
        };
        nav_event!(self.verbose, fields = values.len(), "submitting questionnaire");

        let outcome = match &self.hooks.on_complete {
            None => NavigationOutcome::Submitted,
            Some(complete) => {
                let result = match std::panic::catch_unwind(AssertUnwindSafe(|| complete(values))) {
                    Ok(pending) => AssertUnwindSafe(pending).catch_unwind().await,
                    Err(panic) => Err(panic),
                };
                match result {
                    Ok(Ok(())) => NavigationOutcome::Submitted,
                    Ok(Err(err)) => {
                        tracing::error!(error = %err, "completion callback failed");
                        NavigationOutcome::SubmitFailed(err.to_string())
                    }
                    Err(_) => {
                        tracing::error!("completion callback panicked");
                        NavigationOutcome::SubmitFailed("completion callback panicked".into())
                    }
                }
            }
        };

        write_lock(&self.state, "finishing submit")?.submitting = false;
        Ok(outcome)
    }

    /// Exit phase, content swap, enter phase.
    async fn transition(
        &self,
        from: usize,
        to: usize,
        direction: Direction,
    ) -> FlowResult<NavigationOutcome> {
        let exit = write_lock(&self.state, "starting exit phase")?
            .animation
            .begin_exit(direction)?;
        nav_event!(self.verbose, from, to, ?direction, "exit phase started");
        wait(exit).await;

        let enter = {
            let mut guard = write_lock(&self.state, "swapping step content")?;
            let state = &mut *guard;
            if state.disposed {
                nav_event!(self.verbose, from, to, "session disposed during exit phase");
                return Ok(NavigationOutcome::Disposed);
            }
            state.history.record(from, &state.values);
            let mut restored = state.history.restore_or_seed(to, &state.values);
            // Answers to earlier steps may have been edited since `to` was left.
            for question in self.config.steps[..to].iter().flat_map(|step| &step.questions) {
                match state.values.get(&question.name) {
                    Some(value) => restored.insert(question.name.clone(), value.clone()),
                    None => restored.remove(&question.name),
                };
            }
            state.history.record(to, &restored);
            state.values = restored;
            state.step_activated(to, &self.config.steps[to]);
            state.animation.begin_enter(direction)?
        };
        if let Some(on_step_change) = &self.hooks.on_step_change {
            on_step_change(StepChange {
                from,
                to,
                direction,
            });
        }
        wait(enter).await;

        {
            let mut state = write_lock(&self.state, "settling animation")?;
            if !state.disposed {
                state.animation.settle();
            }
        }
        nav_event!(self.verbose, from, to, ?direction, "step transition finished");

        Ok(match direction {
            Direction::Forward => NavigationOutcome::Advanced { from, to },
            Direction::Backward => NavigationOutcome::Retreated { from, to },
        })
    }

    fn admit(&self, action: &'static str) -> FlowResult<Admission> {
        let mut state = write_lock(&self.state, "claiming transition")?;
        if state.disposed {
            return Ok(Admission::Refused(NavigationOutcome::Disposed));
        }
        if state.transitioning {
            tracing::warn!(action, "navigation rejected, a transition is already in flight");
            return Ok(Admission::Refused(NavigationOutcome::Busy));
        }
        state.transitioning = true;
        Ok(Admission::Granted(TransitionGuard {
            state: Arc::clone(&self.state),
        }))
    }

    fn validate_active_step(&self, state: &mut QuestionnaireState) -> bool {
        let step = &self.config.steps[state.index];
        state
            .dirty
            .extend(step.questions.iter().map(|question| question.name.clone()));
        state.values_changed();
        state.schema.evaluate(&state.values).is_satisfied()
    }

    pub(crate) fn step_satisfied(&self, state: &QuestionnaireState) -> bool {
        let step = &self.config.steps[state.index];
        if !step.has_validators() || step.all_skippable() {
            return true;
        }
        state.schema.evaluate(&state.values).is_satisfied()
    }
}

async fn wait(duration: Duration) {
    if !duration.is_zero() {
        Delay::new(duration).await;
    }
}

pub(crate) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FlowResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FlowError::StatePoisoned(context))
}

pub(crate) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FlowResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FlowError::StatePoisoned(context))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use qa_spec::{Question, QuestionType};

    use super::*;

    fn controller() -> QuestionnaireController {
        let config = StepConfig::new(vec![
            Step::new("One").question(Question::new("name", "Name", QuestionType::Text)),
            Step::new("Two").question(Question::new("city", "City", QuestionType::Text)),
        ]);
        QuestionnaireController::new(config, QuestionnaireOptions::new(), QuestionnaireHooks::new())
            .expect("controller")
    }

    #[test]
    fn guard_releases_the_flag_on_a_poisoned_lock() {
        let controller = controller();
        let Admission::Granted(guard) = controller.admit("advance").expect("admit") else {
            panic!("first navigation should be admitted");
        };

        let state = Arc::clone(&controller.state);
        let _ = thread::spawn(move || {
            let _held = state.write().expect("lock");
            panic!("poison the session lock");
        })
        .join();
        assert!(controller.state.is_poisoned());

        drop(guard);
        let state = controller
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        assert!(!state.transitioning);
    }
}
