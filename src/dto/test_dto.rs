use crate::models::question::QuestionKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestion {
    pub text: String,
    pub kind: QuestionKind,
    /// Required for Input questions, ignored otherwise.
    pub correct_answer: Option<String>,
    /// Only meaningful for Radio/Checkbox questions.
    #[serde(default)]
    pub options: Vec<CreateOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub show_answers: bool,
    #[validate(length(min = 1, message = "a test needs at least one question"))]
    pub questions: Vec<CreateQuestion>,
}

/// Redacted read model for takers: no `correct_answer`, no `is_correct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: Uuid,
    pub position: i32,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<OptionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub id: Uuid,
    pub text: String,
}
