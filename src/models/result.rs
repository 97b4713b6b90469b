use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Score snapshot for one grading attempt. Multiple rows per (user, test)
/// are expected; retakes never overwrite earlier attempts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub score: i32,
    pub passed_at: DateTime<Utc>,
}
