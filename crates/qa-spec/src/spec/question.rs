use std::borrow::Cow;
use std::fmt;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type tag selecting the renderer for a question.
///
/// Built-in tags get their own variant; anything else is carried verbatim in
/// [`QuestionType::Custom`] so hosts can register their own renderers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    Text,
    Email,
    Number,
    Boolean,
    Choice,
    Upload,
    Custom(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Email => "email",
            QuestionType::Number => "number",
            QuestionType::Boolean => "boolean",
            QuestionType::Choice => "choice",
            QuestionType::Upload => "upload",
            QuestionType::Custom(tag) => tag,
        }
    }
}

impl From<String> for QuestionType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => QuestionType::Text,
            "email" => QuestionType::Email,
            "number" => QuestionType::Number,
            "boolean" => QuestionType::Boolean,
            "choice" => QuestionType::Choice,
            "upload" => QuestionType::Upload,
            _ => QuestionType::Custom(tag),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(tag: &str) -> Self {
        QuestionType::from(tag.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(kind: QuestionType) -> Self {
        match kind {
            QuestionType::Custom(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for QuestionType {
    fn schema_name() -> Cow<'static, str> {
        "QuestionType".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "description": "Renderer type tag (text, email, number, boolean, choice, upload or a custom tag)."
        })
    }
}

/// Value kinds accepted by [`Rule::Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Number => value.is_number(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Array => value.is_array(),
        }
    }
}

/// A single check inside a [`Validator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Pattern {
        regex: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinLength {
        min: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MaxLength {
        max: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Min {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Max {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    OneOf {
        values: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Type {
        expected: ValueKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Rule {
    pub fn required() -> Self {
        Rule::Required { message: None }
    }

    pub fn email() -> Self {
        Rule::Email { message: None }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        Rule::Pattern {
            regex: regex.into(),
            message: None,
        }
    }

    pub fn min_length(min: usize) -> Self {
        Rule::MinLength { min, message: None }
    }

    pub fn max_length(max: usize) -> Self {
        Rule::MaxLength { max, message: None }
    }

    pub fn min(value: f64) -> Self {
        Rule::Min {
            value,
            message: None,
        }
    }

    pub fn max(value: f64) -> Self {
        Rule::Max {
            value,
            message: None,
        }
    }

    pub fn one_of(values: impl IntoIterator<Item = Value>) -> Self {
        Rule::OneOf {
            values: values.into_iter().collect(),
            message: None,
        }
    }

    pub fn of_type(expected: ValueKind) -> Self {
        Rule::Type {
            expected,
            message: None,
        }
    }

    /// Replaces the default failure message.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Rule::Required { message }
            | Rule::Email { message }
            | Rule::Pattern { message, .. }
            | Rule::MinLength { message, .. }
            | Rule::MaxLength { message, .. }
            | Rule::Min { message, .. }
            | Rule::Max { message, .. }
            | Rule::OneOf { message, .. }
            | Rule::Type { message, .. } => *message = text,
        }
        self
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Rule::Required { message }
            | Rule::Email { message }
            | Rule::Pattern { message, .. }
            | Rule::MinLength { message, .. }
            | Rule::MaxLength { message, .. }
            | Rule::Min { message, .. }
            | Rule::Max { message, .. }
            | Rule::OneOf { message, .. }
            | Rule::Type { message, .. } => message.as_deref(),
        }
    }
}

/// Ordered list of rules attached to one question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Validator {
    pub rules: Vec<Rule>,
}

impl Validator {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// One field of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    /// Key into the flat form value map.
    pub name: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<Validator>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skippable: bool,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Type-specific fields, forwarded untouched to the renderer.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Question {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            validator: None,
            skippable: false,
            kind,
            payload: Map::new(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn skippable(mut self, skippable: bool) -> Self {
        self.skippable = skippable;
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn has_validator(&self) -> bool {
        self.validator
            .as_ref()
            .is_some_and(|validator| !validator.is_empty())
    }

    /// Choice labels, when the payload carries an `options` array of strings.
    pub fn options(&self) -> Vec<String> {
        self.payload
            .get("options")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
