use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::spec::question::{Question, Rule};

/// One page of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Step {
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheader: Option<String>,
    pub questions: Vec<Question>,
}

impl Step {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            subheader: None,
            questions: Vec::new(),
        }
    }

    pub fn subheader(mut self, subheader: impl Into<String>) -> Self {
        self.subheader = Some(subheader.into());
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn has_validators(&self) -> bool {
        self.questions.iter().any(Question::has_validator)
    }

    pub fn has_skippable(&self) -> bool {
        self.questions.iter().any(|question| question.skippable)
    }

    /// True when every question on the step may be skipped individually.
    pub fn all_skippable(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(|question| question.skippable)
    }
}

/// Ordered, immutable list of steps for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepConfig {
    pub steps: Vec<Step>,
}

impl StepConfig {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SpecError> {
        let config: StepConfig = serde_json::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Structural checks that serde cannot express.
    pub fn check(&self) -> Result<(), SpecError> {
        if self.steps.is_empty() {
            return Err(SpecError::EmptyConfig);
        }

        let mut seen = BTreeSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.questions.is_empty() {
                return Err(SpecError::EmptyStep { index });
            }
            for question in &step.questions {
                if !seen.insert(question.name.as_str()) {
                    return Err(SpecError::DuplicateName {
                        name: question.name.clone(),
                        step: index,
                    });
                }
                let rules = question
                    .validator
                    .iter()
                    .flat_map(|validator| validator.rules.iter());
                for rule in rules {
                    if let Rule::Pattern { regex, .. } = rule
                        && let Err(source) = Regex::new(regex)
                    {
                        return Err(SpecError::InvalidPattern {
                            name: question.name.clone(),
                            source,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
