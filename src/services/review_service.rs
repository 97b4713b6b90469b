use crate::dto::grading_dto::{ReviewOutcome, SubmittedValue};
use crate::error::{Error, Result};
use crate::models::answer::Answer;
use crate::models::question::QuestionKind;
use crate::models::result::TestResult;
use crate::services::evaluator;
use crate::services::grading_service::load_questions;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rebuilds the correctness and correct-answer maps for a past attempt
    /// from its persisted answer rows, using the same evaluator the grading
    /// path uses. The stored score is returned untouched: it is a snapshot,
    /// and the recomputed verdicts may legitimately diverge from it when an
    /// author changed option flags after the attempt, or when a retake has
    /// since replaced the answer rows — answer rows always describe the
    /// newest attempt, so reconstructing an older result replays those.
    pub async fn reconstruct(&self, result_id: Uuid) -> Result<ReviewOutcome> {
        let result = sqlx::query_as::<_, TestResult>(r#"SELECT * FROM results WHERE id = $1"#)
            .bind(result_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Result {} not found", result_id)))?;

        let questions = load_questions(&self.pool, result.test_id).await?;

        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.* FROM answers a
            JOIN questions q ON a.question_id = q.id
            WHERE a.user_id = $1 AND q.test_id = $2
            "#,
        )
        .bind(result.user_id)
        .bind(result.test_id)
        .fetch_all(&self.pool)
        .await?;

        let submission = regroup_answers(&questions, &answers);

        let mut correctness = HashMap::new();
        let mut correct_answers = HashMap::new();
        for loaded in &questions {
            let verdict = evaluator::evaluate(loaded, submission.get(&loaded.question.id));
            correctness.insert(loaded.question.id, verdict.is_correct);
            correct_answers.insert(loaded.question.id, verdict.correct_answer);
        }

        Ok(ReviewOutcome {
            result_id: result.id,
            user_id: result.user_id,
            test_id: result.test_id,
            stored_score: result.score,
            correctness,
            correct_answers,
        })
    }

    /// Attempt history for one taker on one test, newest first.
    pub async fn list_results(&self, user_id: Uuid, test_id: Uuid) -> Result<Vec<TestResult>> {
        let results = sqlx::query_as::<_, TestResult>(
            r#"
            SELECT * FROM results
            WHERE user_id = $1 AND test_id = $2
            ORDER BY passed_at DESC
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}

/// Folds persisted answer rows back into submitted values: the text row for
/// an Input question, the single selected option for Radio, and the set of
/// per-option rows for Checkbox.
fn regroup_answers(
    questions: &[evaluator::LoadedQuestion],
    answers: &[Answer],
) -> HashMap<Uuid, SubmittedValue> {
    let mut submission = HashMap::new();

    for loaded in questions {
        let rows: Vec<&Answer> = answers
            .iter()
            .filter(|a| a.question_id == loaded.question.id)
            .collect();
        if rows.is_empty() {
            continue;
        }

        let value = match loaded.question.kind {
            QuestionKind::Input => rows[0]
                .answer_text
                .clone()
                .map(SubmittedValue::Text),
            QuestionKind::Radio => rows[0]
                .selected_option_id
                .map(|id| SubmittedValue::Selection(vec![id])),
            QuestionKind::Checkbox => Some(SubmittedValue::Selection(
                rows.iter().filter_map(|a| a.selected_option_id).collect(),
            )),
        };

        if let Some(value) = value {
            submission.insert(loaded.question.id, value);
        }
    }

    submission
}
