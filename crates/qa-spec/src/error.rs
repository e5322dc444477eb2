use thiserror::Error;

/// Failures while loading or checking a step configuration.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read step config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse step config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("step config has no steps")]
    EmptyConfig,
    #[error("step {index} has no questions")]
    EmptyStep { index: usize },
    #[error("question name '{name}' on step {step} is already used")]
    DuplicateName { name: String, step: usize },
    #[error("question '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("template render failed: {0}")]
    Template(String),
}
