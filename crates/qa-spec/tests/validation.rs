use serde_json::{Value, json};

use qa_spec::{
    FormValues, QuestionType, SpecError, StepConfig, StepSchema, ValidationOutcome,
    answers_schema, config_schema, validate_config, values_from_json,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "onboarding" => include_str!("../tests/fixtures/onboarding.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn onboarding() -> StepConfig {
    StepConfig::from_json_str(fixture("onboarding")).expect("fixture parses")
}

fn answers(raw: Value) -> FormValues {
    values_from_json(&raw)
}

#[test]
fn fixture_keeps_type_tags_and_payload() {
    let config = onboarding();
    assert_eq!(config.len(), 3);

    let name = &config.steps[0].questions[0];
    assert_eq!(name.kind, QuestionType::Text);
    assert_eq!(name.payload["placeholder"], "Ada Lovelace");

    let avatar = &config.steps[2].questions[1];
    assert_eq!(avatar.kind, QuestionType::Custom("avatar-picker".into()));
    assert!(avatar.skippable);
    assert_eq!(config.steps[2].questions[0].options(), vec!["basic", "pro"]);
}

#[test]
fn config_round_trips_through_json() {
    let config = onboarding();
    let encoded = serde_json::to_value(&config).expect("encode");
    assert_eq!(encoded["steps"][1]["questions"][0]["type"], "email");
    assert!(encoded["steps"][0]["questions"][0].get("skippable").is_none());
    let decoded: StepConfig = serde_json::from_value(encoded).expect("decode");
    assert_eq!(decoded, config);
}

#[test]
fn step_schema_reports_first_message_per_field() {
    let config = onboarding();
    let schema = StepSchema::compile(&config.steps[1]);
    let outcome = schema.evaluate(&answers(json!({ "email": "nope", "age": 9 })));
    let ValidationOutcome::Failed(errors) = outcome else {
        panic!("expected failures");
    };
    assert_eq!(errors["email"], "Enter a valid email address.");
    assert_eq!(errors["age"], "Must be at least 13.");
}

#[test]
fn custom_required_message_is_used() {
    let config = onboarding();
    let errors = validate_config(&config, &answers(json!({ "name": "" })));
    assert_eq!(errors[&0]["name"], "Please enter your name.");
    assert_eq!(errors[&1]["email"], "This field is required.");
    assert!(!errors.contains_key(&2));
}

#[test]
fn complete_answers_validate_cleanly() {
    let config = onboarding();
    let errors = validate_config(
        &config,
        &answers(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "plan": "pro"
        })),
    );
    assert!(errors.is_empty());
}

#[test]
fn duplicate_names_are_rejected() {
    let raw = json!({
        "steps": [
            { "header": "A", "questions": [{ "name": "x", "prompt": "x", "type": "text" }] },
            { "header": "B", "questions": [{ "name": "x", "prompt": "x again", "type": "text" }] }
        ]
    });
    let err = StepConfig::from_json_str(&raw.to_string()).unwrap_err();
    assert!(matches!(err, SpecError::DuplicateName { ref name, step: 1 } if name == "x"));
}

#[test]
fn empty_configs_and_steps_are_rejected() {
    let err = StepConfig::from_json_str(r#"{ "steps": [] }"#).unwrap_err();
    assert!(matches!(err, SpecError::EmptyConfig));

    let err = StepConfig::from_json_str(r#"{ "steps": [{ "header": "A", "questions": [] }] }"#)
        .unwrap_err();
    assert!(matches!(err, SpecError::EmptyStep { index: 0 }));
}

#[test]
fn broken_patterns_are_rejected_at_load() {
    let raw = json!({
        "steps": [{
            "header": "A",
            "questions": [{
                "name": "code",
                "prompt": "Code",
                "type": "text",
                "validator": { "rules": [{ "rule": "pattern", "regex": "([a-z" }] }
            }]
        }]
    });
    let err = StepConfig::from_json_str(&raw.to_string()).unwrap_err();
    assert!(matches!(err, SpecError::InvalidPattern { .. }));
}

#[test]
fn answers_schema_lists_required_fields() {
    let schema = answers_schema(&onboarding());
    let props = schema["properties"].as_object().expect("properties");
    assert_eq!(props["email"]["format"], "email");
    assert_eq!(props["age"]["minimum"], 13.0);
    assert_eq!(props["plan"]["enum"], json!(["basic", "pro"]));
    let required = schema["required"].as_array().expect("required");
    assert!(required.iter().any(|value| value == "name"));
    assert!(required.iter().any(|value| value == "email"));
    assert!(!required.iter().any(|value| value == "plan"));
}

#[test]
fn config_schema_describes_steps() {
    let schema = config_schema();
    assert!(schema.to_string().contains("steps"));
}
