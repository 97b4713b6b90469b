use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted response row. Input answers carry `answer_text`, Radio
/// answers carry a single `selected_option_id`, and a Checkbox submission is
/// stored as one row per selected option sharing the same user + question.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub selected_option_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
