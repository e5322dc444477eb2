pub mod question;
pub mod step;

pub use question::{Question, QuestionType, Rule, Validator, ValueKind};
pub use step::{Step, StepConfig};
