use std::time::Instant;

use qa_spec::{ErrorMap, FormValues, Step};
use serde_json::Value;

use crate::animation::{AnimationPhase, Direction};
use crate::controller::{NavigationOutcome, QuestionnaireController, read_lock};
use crate::error::FlowResult;
use crate::preset::Transform;
use crate::registry::{ComponentRegistry, QuestionProps};

/// Controller-backed actions exposed to renderers.
#[derive(Clone, Debug)]
pub struct StepActions {
    controller: QuestionnaireController,
}

impl StepActions {
    pub async fn advance(&self) -> FlowResult<NavigationOutcome> {
        self.controller.advance().await
    }

    pub async fn retreat(&self) -> FlowResult<NavigationOutcome> {
        self.controller.retreat().await
    }

    pub async fn skip(&self) -> FlowResult<NavigationOutcome> {
        self.controller.skip().await
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) -> FlowResult<()> {
        self.controller.set_field(name, value)
    }

    pub fn set_field_processing(
        &self,
        name: impl Into<String>,
        value: Value,
        processing: bool,
    ) -> FlowResult<()> {
        self.controller.set_field_processing(name, value, processing)
    }
}

/// Frozen view of a session taken at one instant.
#[derive(Clone, Debug)]
pub struct PresentationSnapshot {
    pub index: usize,
    pub total_steps: usize,
    pub is_satisfied: bool,
    pub is_submitting: bool,
    pub is_field_processing: bool,
    pub has_skippable: bool,
    pub is_transitioning: bool,
    pub step: Step,
    pub values: FormValues,
    pub errors: ErrorMap,
    pub direction: Direction,
    pub phase: AnimationPhase,
    pub transform: Transform,
    /// `(enter, exit)` preset identifiers.
    pub preset_ids: (&'static str, &'static str),
    pub actions: StepActions,
}

impl PresentationSnapshot {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total_steps
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }
}

impl QuestionnaireController {
    /// Captures everything a presentation layer needs under one lock.
    pub fn snapshot(&self) -> FlowResult<PresentationSnapshot> {
        let state = read_lock(&self.state, "taking presentation snapshot")?;
        let step = self.config.steps[state.index].clone();
        Ok(PresentationSnapshot {
            index: state.index,
            total_steps: self.config.len(),
            is_satisfied: self.step_satisfied(&state),
            is_submitting: state.submitting,
            is_field_processing: state.field_processing,
            has_skippable: step.has_skippable(),
            is_transitioning: state.transitioning,
            step,
            values: state.values.clone(),
            errors: state.errors.clone(),
            direction: state.animation.direction(),
            phase: state.animation.phase(),
            transform: state.animation.frame(Instant::now()),
            preset_ids: state.animation.preset_ids(),
            actions: StepActions {
                controller: self.clone(),
            },
        })
    }
}

/// Renders the chrome around a step. Questions go through a
/// [`ComponentRegistry`].
pub trait PresentationShell {
    type Output;

    fn render_header(&self, snapshot: &PresentationSnapshot) -> Self::Output;

    fn render_footer(&self, snapshot: &PresentationSnapshot) -> Self::Output;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedStep<O> {
    pub header: O,
    /// Question name and output, in step order. Questions with an
    /// unregistered type are left out.
    pub questions: Vec<(String, O)>,
    pub footer: O,
}

pub fn render_step<S>(
    shell: &S,
    registry: &ComponentRegistry<S::Output>,
    snapshot: &PresentationSnapshot,
) -> RenderedStep<S::Output>
where
    S: PresentationShell,
{
    let questions = snapshot
        .step
        .questions
        .iter()
        .enumerate()
        .filter_map(|(position, question)| {
            let props = QuestionProps {
                value: snapshot.value(&question.name),
                error: snapshot.error(&question.name),
                position,
                snapshot,
            };
            registry
                .render(question, &props)
                .map(|output| (question.name.clone(), output))
        })
        .collect();

    RenderedStep {
        header: shell.render_header(snapshot),
        questions,
        footer: shell.render_footer(snapshot),
    }
}
