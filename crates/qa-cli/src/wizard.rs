use std::sync::Arc;

use qa_flow::{ComponentRegistry, PresentationShell, PresentationSnapshot, QuestionProps, RenderedStep};
use qa_spec::{ErrorMap, FormValues, Question, QuestionType, TemplateEngine, values_to_json};
use serde_json::{Number, Value};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: step headers and question prompts only.
    Clean,
    /// Verbose output: status line, presets, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// What the user typed at a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// `None` keeps the current value.
    Answer(Option<Value>),
    Back,
    Skip,
    Exit,
}

/// Reads one prompt line: a navigation command or an answer to `question`.
pub fn read_input(question: &Question, raw: &str) -> Result<Input, AnswerParseError> {
    match Input::command(raw) {
        Some(command) => Ok(command),
        None => parse_answer(question, raw).map(Input::Answer),
    }
}

impl Input {
    pub fn command(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "back" => Some(Input::Back),
            "skip" => Some(Input::Skip),
            "exit" => Some(Input::Exit),
            _ => None,
        }
    }
}

/// Terminal shell: renders step chrome and prints results.
pub struct WizardPresenter {
    verbosity: Verbosity,
    show_answers_json: bool,
    templates: TemplateEngine,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            show_answers_json,
            templates: TemplateEngine::new(),
        }
    }

    /// Prints the step chrome; question lines are printed by the prompt loop.
    pub fn show_step(&self, rendered: &RenderedStep<String>) {
        println!();
        println!("{}", rendered.header);
        println!("{}", rendered.footer);
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_errors(&self, errors: &ErrorMap) {
        println!("Please fix the following:");
        for (name, message) in errors {
            println!("  {} - {}", name, message);
        }
    }

    pub fn show_completion(&self, values: &FormValues) {
        println!("Done ✅");
        if self.show_answers_json {
            match serde_json::to_string_pretty(&values_to_json(values)) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        } else {
            for (name, value) in values {
                println!("  {}: {}", name, display_value(value));
            }
        }
    }
}

impl PresentationShell for WizardPresenter {
    type Output = String;

    fn render_header(&self, snapshot: &PresentationSnapshot) -> String {
        let header = self
            .templates
            .render_or_raw(&snapshot.step.header, &snapshot.values);
        let mut out = format!(
            "Step {}/{}: {}",
            snapshot.index + 1,
            snapshot.total_steps,
            header
        );
        if let Some(subheader) = &snapshot.step.subheader {
            out.push('\n');
            out.push_str(&self.templates.render_or_raw(subheader, &snapshot.values));
        }
        if self.verbosity.is_verbose() {
            let (enter, exit) = snapshot.preset_ids;
            out.push_str(&format!(
                "\nStatus: {} (enter: {}, exit: {})",
                if snapshot.is_satisfied { "ready" } else { "incomplete" },
                enter,
                exit
            ));
        }
        out
    }

    fn render_footer(&self, snapshot: &PresentationSnapshot) -> String {
        let mut commands = vec!["back", "exit"];
        if snapshot.has_skippable {
            commands.insert(1, "skip");
        }
        let next = if snapshot.is_last() { "submit" } else { "continue" };
        format!(
            "(press enter to keep a value; {} after the last answer; commands: {})",
            next,
            commands.join(", ")
        )
    }
}

/// Renderers for the built-in question types. Custom type tags are left
/// unregistered and are not prompted for.
pub fn terminal_registry() -> ComponentRegistry<String> {
    let templates = Arc::new(TemplateEngine::new());
    let mut registry = ComponentRegistry::new();
    for kind in [
        QuestionType::Text,
        QuestionType::Email,
        QuestionType::Number,
        QuestionType::Boolean,
        QuestionType::Choice,
        QuestionType::Upload,
    ] {
        let templates = Arc::clone(&templates);
        registry.register_fn(kind.as_str(), move |question, props| {
            render_prompt(&templates, question, props)
        });
    }
    registry
}

fn render_prompt(
    templates: &TemplateEngine,
    question: &Question,
    props: &QuestionProps<'_>,
) -> String {
    let prompt = templates.render_or_raw(&question.prompt, &props.snapshot.values);
    let mut line = format!("{}. {}", props.position + 1, prompt);
    if !question.skippable && question.has_validator() {
        line.push_str(" *");
    }
    if let Some(hint) = hint(question) {
        line.push(' ');
        line.push_str(&hint);
    }
    if let Some(value) = props.value {
        line.push_str(&format!(" [{}]", display_value(value)));
    }
    if let Some(error) = props.error {
        line.push_str(&format!("\n   ! {}", error));
    }
    line
}

fn hint(question: &Question) -> Option<String> {
    match &question.kind {
        QuestionType::Boolean => Some("(yes/no, y/n, true/false)".to_string()),
        QuestionType::Number => Some("(number)".to_string()),
        QuestionType::Email => Some("(email)".to_string()),
        QuestionType::Upload => Some("(file path)".to_string()),
        QuestionType::Choice => {
            let options = question.options();
            (!options.is_empty()).then(|| format!("({})", options.join("/")))
        }
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Parses a prompt line for `question`. An empty line yields `Ok(None)`.
pub fn parse_answer(question: &Question, raw: &str) -> Result<Option<Value>, AnswerParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = match &question.kind {
        QuestionType::Boolean => parse_boolean(trimmed)?,
        QuestionType::Number => parse_number(trimmed)?,
        QuestionType::Choice => parse_choice(question, trimmed)?,
        _ => Value::String(trimmed.to_string()),
    };
    Ok(Some(value))
}

fn parse_boolean(raw: &str) -> Result<Value, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Ok(Value::Number(Number::from(integer)));
    }
    raw.parse::<f64>()
        .map_err(|_| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
        .and_then(|value| {
            Number::from_f64(value).map(Value::Number).ok_or_else(|| {
                AnswerParseError::new(
                    "Please enter a finite number.",
                    Some("number must be finite".to_string()),
                )
            })
        })
}

fn parse_choice(question: &Question, raw: &str) -> Result<Value, AnswerParseError> {
    let allowed = question.options();
    if allowed.is_empty() {
        return Ok(Value::String(raw.to_string()));
    }
    if let Some(choice) = allowed
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(raw))
    {
        Ok(Value::String(choice.to_string()))
    } else {
        Err(AnswerParseError::new(
            format!("Choose one of: {}.", allowed.join(", ")),
            Some(format!("allowed values: {}", allowed.join(", "))),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(kind: QuestionType) -> Question {
        Question::new("field", "Field", kind)
    }

    #[test]
    fn parse_answer_boolean_accepts_yes() {
        assert_eq!(
            parse_answer(&question(QuestionType::Boolean), "yes").unwrap(),
            Some(Value::Bool(true))
        );
        assert!(parse_answer(&question(QuestionType::Boolean), "maybe").is_err());
    }

    #[test]
    fn parse_answer_number_prefers_integers() {
        let number = question(QuestionType::Number);
        assert_eq!(parse_answer(&number, "42").unwrap(), Some(json!(42)));
        assert_eq!(parse_answer(&number, "2.5").unwrap(), Some(json!(2.5)));
        assert!(parse_answer(&number, "forty").is_err());
    }

    #[test]
    fn parse_answer_choice_checks_options() {
        let plan = question(QuestionType::Choice).with_payload("options", json!(["basic", "pro"]));
        assert_eq!(parse_answer(&plan, "PRO").unwrap(), Some(json!("pro")));
        let err = parse_answer(&plan, "enterprise").unwrap_err();
        assert_eq!(err.user_message, "Choose one of: basic, pro.");
    }

    #[test]
    fn blank_input_keeps_the_current_value() {
        assert_eq!(parse_answer(&question(QuestionType::Text), "   ").unwrap(), None);
    }

    #[test]
    fn commands_are_recognised_case_insensitively() {
        assert_eq!(Input::command("Back"), Some(Input::Back));
        assert_eq!(Input::command(" skip "), Some(Input::Skip));
        assert_eq!(Input::command("exit"), Some(Input::Exit));
        assert_eq!(Input::command("Ada"), None);
    }

    #[test]
    fn read_input_prefers_commands_over_answers() {
        let name = question(QuestionType::Text);
        assert_eq!(read_input(&name, "back").unwrap(), Input::Back);
        assert_eq!(
            read_input(&name, "Ada").unwrap(),
            Input::Answer(Some(json!("Ada")))
        );
    }

    #[test]
    fn custom_types_are_not_registered() {
        let registry = terminal_registry();
        assert!(registry.contains("email"));
        assert!(registry.get("avatar-picker").is_err());
    }
}
