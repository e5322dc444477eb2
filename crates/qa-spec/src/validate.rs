use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::spec::question::{Rule, Validator};
use crate::spec::step::{Step, StepConfig};
use crate::values::{ErrorMap, FormValues, is_blank};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Result of evaluating a [`StepSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Satisfied,
    Failed(ErrorMap),
}

impl ValidationOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ValidationOutcome::Satisfied)
    }

    /// The failures, empty when satisfied.
    pub fn into_errors(self) -> ErrorMap {
        match self {
            ValidationOutcome::Satisfied => ErrorMap::new(),
            ValidationOutcome::Failed(errors) => errors,
        }
    }
}

#[derive(Debug, Clone)]
enum CompiledRule {
    Required(Option<String>),
    Email(Option<String>),
    Pattern(Regex, Option<String>),
    MinLength(usize, Option<String>),
    MaxLength(usize, Option<String>),
    Min(f64, Option<String>),
    Max(f64, Option<String>),
    OneOf(Vec<Value>, Option<String>),
    Type(crate::spec::question::ValueKind, Option<String>),
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Option<Self> {
        let message = rule.message().map(String::from);
        let compiled = match rule {
            Rule::Required { .. } => CompiledRule::Required(message),
            Rule::Email { .. } => CompiledRule::Email(message),
            // Unchecked configs may carry a broken pattern; such a rule never fails.
            Rule::Pattern { regex, .. } => CompiledRule::Pattern(Regex::new(regex).ok()?, message),
            Rule::MinLength { min, .. } => CompiledRule::MinLength(*min, message),
            Rule::MaxLength { max, .. } => CompiledRule::MaxLength(*max, message),
            Rule::Min { value, .. } => CompiledRule::Min(*value, message),
            Rule::Max { value, .. } => CompiledRule::Max(*value, message),
            Rule::OneOf { values, .. } => CompiledRule::OneOf(values.clone(), message),
            Rule::Type { expected, .. } => CompiledRule::Type(*expected, message),
        };
        Some(compiled)
    }

    fn check(&self, value: Option<&Value>) -> Option<String> {
        if let CompiledRule::Required(message) = self {
            return is_blank(value)
                .then(|| message_or(message, || "This field is required.".into()));
        }
        if is_blank(value) {
            return None;
        }
        let value = value?;

        match self {
            CompiledRule::Required(_) => None,
            CompiledRule::Email(message) => value
                .as_str()
                .filter(|text| EMAIL.is_match(text.trim()))
                .is_none()
                .then(|| message_or(message, || "Enter a valid email address.".into())),
            CompiledRule::Pattern(regex, message) => value
                .as_str()
                .filter(|text| regex.is_match(text))
                .is_none()
                .then(|| message_or(message, || "Value has an invalid format.".into())),
            CompiledRule::MinLength(min, message) => (length_of(value) < *min)
                .then(|| message_or(message, || format!("Must be at least {min} characters."))),
            CompiledRule::MaxLength(max, message) => (length_of(value) > *max)
                .then(|| message_or(message, || format!("Must be at most {max} characters."))),
            CompiledRule::Min(min, message) => value
                .as_f64()
                .is_none_or(|number| number < *min)
                .then(|| message_or(message, || format!("Must be at least {min}."))),
            CompiledRule::Max(max, message) => value
                .as_f64()
                .is_none_or(|number| number > *max)
                .then(|| message_or(message, || format!("Must be at most {max}."))),
            CompiledRule::OneOf(allowed, message) => (!allowed.contains(value)).then(|| {
                message_or(message, || {
                    let labels = allowed.iter().map(display_value).collect::<Vec<_>>();
                    format!("Choose one of: {}.", labels.join(", "))
                })
            }),
            CompiledRule::Type(expected, message) => (!expected.matches(value))
                .then(|| message_or(message, || format!("Expected a {} value.", expected.as_str()))),
        }
    }
}

fn message_or(message: &Option<String>, fallback: impl FnOnce() -> String) -> String {
    message.clone().unwrap_or_else(fallback)
}

fn length_of(value: &Value) -> usize {
    match value {
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        other => other.to_string().chars().count(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Per-step schema built from the questions' declared validators.
///
/// Questions without a validator never appear in the schema and are always
/// valid.
#[derive(Debug, Clone, Default)]
pub struct StepSchema {
    fields: Vec<(String, Vec<CompiledRule>)>,
}

impl StepSchema {
    pub fn compile(step: &Step) -> Self {
        let fields = step
            .questions
            .iter()
            .filter_map(|question| {
                let validator = question.validator.as_ref()?;
                let rules = compile_rules(validator);
                (!rules.is_empty()).then(|| (question.name.clone(), rules))
            })
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn evaluate(&self, values: &FormValues) -> ValidationOutcome {
        let errors = self
            .fields
            .iter()
            .filter_map(|(name, rules)| {
                let value = values.get(name);
                rules
                    .iter()
                    .find_map(|rule| rule.check(value))
                    .map(|message| (name.clone(), message))
            })
            .collect::<ErrorMap>();

        if errors.is_empty() {
            ValidationOutcome::Satisfied
        } else {
            ValidationOutcome::Failed(errors)
        }
    }
}

fn compile_rules(validator: &Validator) -> Vec<CompiledRule> {
    validator
        .rules
        .iter()
        .filter_map(CompiledRule::compile)
        .collect()
}

pub fn validate_step(step: &Step, values: &FormValues) -> ValidationOutcome {
    StepSchema::compile(step).evaluate(values)
}

/// Evaluates every step; only failing steps appear in the result.
pub fn validate_config(config: &StepConfig, values: &FormValues) -> BTreeMap<usize, ErrorMap> {
    config
        .steps
        .iter()
        .enumerate()
        .filter_map(|(index, step)| match validate_step(step, values) {
            ValidationOutcome::Satisfied => None,
            ValidationOutcome::Failed(errors) => Some((index, errors)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::question::{Question, QuestionType, ValueKind};
    use serde_json::json;

    fn values(raw: Value) -> FormValues {
        crate::values::values_from_json(&raw)
    }

    #[test]
    fn first_failing_rule_wins() {
        let step = Step::new("Account").question(
            Question::new("email", "Email", QuestionType::Email)
                .with_validator(Validator::new([Rule::required(), Rule::email()])),
        );
        let errors = validate_step(&step, &values(json!({}))).into_errors();
        assert_eq!(errors["email"], "This field is required.");

        let errors = validate_step(&step, &values(json!({ "email": "bad" }))).into_errors();
        assert_eq!(errors["email"], "Enter a valid email address.");

        assert!(validate_step(&step, &values(json!({ "email": "ada@example.com" }))).is_satisfied());
    }

    #[test]
    fn optional_rules_pass_on_blank_values() {
        let step = Step::new("Profile").question(
            Question::new("nick", "Nickname", QuestionType::Text)
                .with_validator(Validator::new([Rule::min_length(3)])),
        );
        assert!(validate_step(&step, &values(json!({ "nick": "" }))).is_satisfied());
        let errors = validate_step(&step, &values(json!({ "nick": "ab" }))).into_errors();
        assert_eq!(errors["nick"], "Must be at least 3 characters.");
    }

    #[test]
    fn custom_messages_replace_defaults() {
        let step = Step::new("Age").question(
            Question::new("age", "Age", QuestionType::Number).with_validator(Validator::new([
                Rule::of_type(ValueKind::Number),
                Rule::min(18.0).with_message("Adults only."),
            ])),
        );
        let errors = validate_step(&step, &values(json!({ "age": 12 }))).into_errors();
        assert_eq!(errors["age"], "Adults only.");
        let errors = validate_step(&step, &values(json!({ "age": "twelve" }))).into_errors();
        assert_eq!(errors["age"], "Expected a number value.");
    }

    #[test]
    fn unvalidated_questions_are_ignored() {
        let step = Step::new("Misc")
            .question(Question::new("free", "Anything", QuestionType::Text))
            .question(
                Question::new("plan", "Plan", QuestionType::Choice).with_validator(Validator::new(
                    [Rule::one_of([json!("basic"), json!("pro")])],
                )),
            );
        let schema = StepSchema::compile(&step);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["plan"]);
        let errors = schema.evaluate(&values(json!({ "plan": "gold" }))).into_errors();
        assert_eq!(errors["plan"], "Choose one of: basic, pro.");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let step = Step::new("Two")
            .question(
                Question::new("b", "B", QuestionType::Text)
                    .with_validator(Validator::new([Rule::required()])),
            )
            .question(
                Question::new("a", "A", QuestionType::Text)
                    .with_validator(Validator::new([Rule::pattern("^[0-9]+$")])),
            );
        let input = values(json!({ "a": "x1" }));
        let first = validate_step(&step, &input);
        let second = validate_step(&step, &input);
        assert_eq!(first, second);
        assert_eq!(first.into_errors().len(), 2);
    }
}
