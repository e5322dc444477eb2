use handlebars::Handlebars;

use crate::error::SpecError;
use crate::values::{FormValues, values_to_json};

/// Renders step headers and prompts that reference collected answers,
/// e.g. `"Thanks, {{name}}"`.
///
/// Rendering is lenient: unknown names render as empty text and nothing is
/// HTML-escaped, since the output is plain display text.
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    pub fn render(&self, text: &str, values: &FormValues) -> Result<String, SpecError> {
        if !text.contains("{{") {
            return Ok(text.to_string());
        }
        self.registry
            .render_template(text, &values_to_json(values))
            .map_err(|err| SpecError::Template(err.to_string()))
    }

    /// Like [`TemplateEngine::render`] but falls back to the raw text.
    pub fn render_or_raw(&self, text: &str, values: &FormValues) -> String {
        self.render(text, values)
            .unwrap_or_else(|_| text.to_string())
    }
}
