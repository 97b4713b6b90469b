use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Input,
    Radio,
    Checkbox,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub test_id: Uuid,
    pub question_text: String,
    pub kind: QuestionKind,
    /// 1-based, contiguous, fixed at creation time from submission order.
    pub position: i32,
    /// Present iff kind is Input; Radio/Checkbox correctness lives in the
    /// options' `is_correct` flags.
    pub correct_answer: Option<String>,
}
