use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use qa_spec::Question;
use serde_json::Value;

use crate::error::RegistryError;
use crate::presentation::PresentationSnapshot;

/// Per-question view handed to a renderer.
#[derive(Clone, Debug)]
pub struct QuestionProps<'a> {
    pub value: Option<&'a Value>,
    pub error: Option<&'a str>,
    /// Position of the question within its step.
    pub position: usize,
    pub snapshot: &'a PresentationSnapshot,
}

/// Turns one question into renderable output.
pub trait QuestionRenderer<O>: Send + Sync {
    fn render(&self, question: &Question, props: &QuestionProps<'_>) -> O;
}

impl<O, F> QuestionRenderer<O> for F
where
    F: Fn(&Question, &QuestionProps<'_>) -> O + Send + Sync,
{
    fn render(&self, question: &Question, props: &QuestionProps<'_>) -> O {
        self(question, props)
    }
}

/// Session-scoped map from question type tag to renderer.
pub struct ComponentRegistry<O> {
    renderers: BTreeMap<String, Arc<dyn QuestionRenderer<O>>>,
}

impl<O> Default for ComponentRegistry<O> {
    fn default() -> Self {
        Self {
            renderers: BTreeMap::new(),
        }
    }
}

impl<O> fmt::Debug for ComponentRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.list())
            .finish()
    }
}

impl<O> ComponentRegistry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `renderer` for `tag`, replacing any earlier registration.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        renderer: impl QuestionRenderer<O> + 'static,
    ) -> &mut Self {
        let tag = tag.into();
        if self.renderers.insert(tag.clone(), Arc::new(renderer)).is_some() {
            tracing::debug!(tag = %tag, "replaced question renderer");
        }
        self
    }

    pub fn register_fn<F>(&mut self, tag: impl Into<String>, renderer: F) -> &mut Self
    where
        F: Fn(&Question, &QuestionProps<'_>) -> O + Send + Sync + 'static,
    {
        self.register(tag, renderer)
    }

    pub fn get(&self, tag: &str) -> Result<Arc<dyn QuestionRenderer<O>>, RegistryError> {
        self.renderers
            .get(tag)
            .cloned()
            .ok_or_else(|| RegistryError::UnregisteredType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.renderers.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.renderers.keys().map(String::as_str).collect()
    }

    /// Renders through the renderer registered for the question's type tag.
    /// An unknown tag renders nothing.
    pub fn render(&self, question: &Question, props: &QuestionProps<'_>) -> Option<O> {
        match self.get(question.kind.as_str()) {
            Ok(renderer) => Some(renderer.render(question, props)),
            Err(err) => {
                tracing::warn!(question = %question.name, error = %err, "skipping question");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_spec::QuestionType;

    #[test]
    fn lists_tags_in_order() {
        let mut registry = ComponentRegistry::<String>::new();
        registry
            .register_fn("text", |question, _| question.name.clone())
            .register_fn("boolean", |_, _| "yes/no".to_string());
        assert_eq!(registry.list(), vec!["boolean", "text"]);
        assert!(registry.contains("text"));
    }

    #[test]
    fn unknown_tags_raise_unregistered_type() {
        let registry = ComponentRegistry::<String>::new();
        let err = registry
            .get(QuestionType::Custom("signature".into()).as_str())
            .err()
            .expect("unregistered");
        assert_eq!(err, RegistryError::UnregisteredType("signature".into()));
    }
}
