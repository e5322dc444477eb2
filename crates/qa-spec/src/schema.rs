use serde_json::{Map, Value, json};

use crate::spec::question::{QuestionType, Rule, ValueKind};
use crate::spec::step::StepConfig;

/// JSON schema describing the step configuration file format.
pub fn config_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(StepConfig)).unwrap_or(Value::Null)
}

/// JSON schema for the answers a configuration collects.
///
/// Fields carrying a `required` rule are listed under `required`.
pub fn answers_schema(config: &StepConfig) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in config.steps.iter().flat_map(|step| step.questions.iter()) {
        let mut property = Map::new();
        property.insert("title".into(), Value::String(question.prompt.clone()));
        if let Some(kind) = json_type(question) {
            property.insert("type".into(), Value::String(kind.into()));
        }
        if matches!(question.kind, QuestionType::Email) {
            property.insert("format".into(), Value::String("email".into()));
        }

        let rules = question
            .validator
            .iter()
            .flat_map(|validator| validator.rules.iter());
        for rule in rules {
            match rule {
                Rule::Required { .. } => required.push(Value::String(question.name.clone())),
                Rule::Pattern { regex, .. } => {
                    property.insert("pattern".into(), Value::String(regex.clone()));
                }
                Rule::MinLength { min, .. } => {
                    property.insert("minLength".into(), json!(min));
                }
                Rule::MaxLength { max, .. } => {
                    property.insert("maxLength".into(), json!(max));
                }
                Rule::Min { value, .. } => {
                    property.insert("minimum".into(), json!(value));
                }
                Rule::Max { value, .. } => {
                    property.insert("maximum".into(), json!(value));
                }
                Rule::OneOf { values, .. } => {
                    property.insert("enum".into(), Value::Array(values.clone()));
                }
                Rule::Email { .. } | Rule::Type { .. } => {}
            }
        }

        properties.insert(question.name.clone(), Value::Object(property));
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn json_type(question: &crate::spec::question::Question) -> Option<&'static str> {
    let declared = question
        .validator
        .iter()
        .flat_map(|validator| validator.rules.iter())
        .find_map(|rule| match rule {
            Rule::Type { expected, .. } => Some(*expected),
            _ => None,
        });
    if let Some(kind) = declared {
        return Some(match kind {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
        });
    }
    match question.kind {
        QuestionType::Text | QuestionType::Email | QuestionType::Choice => Some("string"),
        QuestionType::Number => Some("number"),
        QuestionType::Boolean => Some("boolean"),
        QuestionType::Upload | QuestionType::Custom(_) => None,
    }
}
