#![allow(missing_docs)]

pub mod error;
pub mod schema;
pub mod spec;
pub mod template;
pub mod validate;
pub mod values;

pub use error::SpecError;
pub use schema::{answers_schema, config_schema};
pub use spec::{Question, QuestionType, Rule, Step, StepConfig, Validator, ValueKind};
pub use template::TemplateEngine;
pub use validate::{StepSchema, ValidationOutcome, validate_config, validate_step};
pub use values::{ErrorMap, FormValues, is_blank, values_from_json, values_to_json};
