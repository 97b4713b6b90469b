use crate::dto::grading_dto::{GradingOutcome, Submission, SubmittedValue};
use crate::error::{Error, Result};
use crate::models::option::AnswerOption;
use crate::models::question::{Question, QuestionKind};
use crate::models::result::TestResult;
use crate::services::evaluator::{self, LoadedQuestion};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

#[derive(Clone)]
pub struct GradingService {
    pool: PgPool,
}

impl GradingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grades a full submission against a test: every question is evaluated
    /// (absent answers count as empty), answer rows and exactly one result
    /// row are written in a single transaction, and the per-question verdicts
    /// are returned together with the created result.
    ///
    /// Retakes are allowed; each call produces an independent result row.
    /// Answer rows describe the latest attempt only: the previous attempt's
    /// rows for this user and test are replaced inside the same transaction.
    pub async fn grade(
        &self,
        user_id: Uuid,
        test_id: Uuid,
        submission: &Submission,
    ) -> Result<GradingOutcome> {
        let exists: Option<Uuid> = sqlx::query_scalar(r#"SELECT id FROM tests WHERE id = $1"#)
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("Test {} not found", test_id)));
        }

        let questions = load_questions(&self.pool, test_id).await?;

        for loaded in &questions {
            check_submitted_shape(loaded, submission.get(&loaded.question.id))?;
        }
        self.ensure_options_exist(&questions, submission).await?;

        let mut correctness = HashMap::new();
        let mut correct_answers = HashMap::new();
        let mut score: i32 = 0;

        for loaded in &questions {
            let submitted = submission.get(&loaded.question.id);
            let verdict = evaluator::evaluate(loaded, submitted);
            if verdict.is_correct {
                score += 1;
            }
            correctness.insert(loaded.question.id, verdict.is_correct);
            correct_answers.insert(loaded.question.id, verdict.correct_answer);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM answers a USING questions q
            WHERE a.question_id = q.id AND q.test_id = $1 AND a.user_id = $2
            "#,
        )
        .bind(test_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        for loaded in &questions {
            let Some(submitted) = submission.get(&loaded.question.id) else {
                continue;
            };

            match (loaded.question.kind, submitted) {
                (QuestionKind::Input, SubmittedValue::Text(text)) => {
                    sqlx::query(
                        r#"INSERT INTO answers (user_id, question_id, answer_text) VALUES ($1, $2, $3)"#,
                    )
                    .bind(user_id)
                    .bind(loaded.question.id)
                    .bind(text)
                    .execute(&mut *tx)
                    .await?;
                }
                (QuestionKind::Radio, value) => {
                    // ensure_options_exist already proved the id is real; a
                    // wrong option persists fine and is simply graded false.
                    if let Some(option_id) = single_selection(value) {
                        sqlx::query(
                            r#"INSERT INTO answers (user_id, question_id, selected_option_id) VALUES ($1, $2, $3)"#,
                        )
                        .bind(user_id)
                        .bind(loaded.question.id)
                        .bind(option_id)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
                (QuestionKind::Checkbox, SubmittedValue::Selection(ids)) => {
                    let unique: BTreeSet<Uuid> = ids.iter().copied().collect();
                    for option_id in unique {
                        sqlx::query(
                            r#"INSERT INTO answers (user_id, question_id, selected_option_id) VALUES ($1, $2, $3)"#,
                        )
                        .bind(user_id)
                        .bind(loaded.question.id)
                        .bind(option_id)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
                // Shape mismatches were rejected before the transaction.
                _ => {}
            }
        }

        let result = sqlx::query_as::<_, TestResult>(
            r#"
            INSERT INTO results (user_id, test_id, score)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .bind(score)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            test_id = %test_id,
            score,
            out_of = questions.len(),
            "submission graded"
        );

        Ok(GradingOutcome {
            correctness,
            correct_answers,
            result,
        })
    }

    /// Rejects option references that exist nowhere in the options table:
    /// those are unpersistable under the answers foreign key. A real option
    /// that merely belongs to a different question is a wrong answer, not a
    /// malformed one; it persists and grades false.
    async fn ensure_options_exist(
        &self,
        questions: &[LoadedQuestion],
        submission: &Submission,
    ) -> Result<()> {
        let known: HashSet<Uuid> = questions
            .iter()
            .flat_map(|l| l.options.iter().map(|o| o.id))
            .collect();

        let mut unresolved: Vec<Uuid> = Vec::new();
        for loaded in questions {
            let Some(value) = submission.get(&loaded.question.id) else {
                continue;
            };
            match (loaded.question.kind, value) {
                (QuestionKind::Radio, value) => {
                    if let Some(id) = single_selection(value) {
                        if !known.contains(&id) {
                            unresolved.push(id);
                        }
                    }
                }
                (QuestionKind::Checkbox, SubmittedValue::Selection(ids)) => {
                    unresolved.extend(ids.iter().copied().filter(|id| !known.contains(id)));
                }
                _ => {}
            }
        }

        if unresolved.is_empty() {
            return Ok(());
        }
        unresolved.sort();
        unresolved.dedup();

        let existing: Vec<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM options WHERE id = ANY($1)"#)
                .bind(&unresolved)
                .fetch_all(&self.pool)
                .await?;

        if let Some(missing) = unresolved.iter().find(|id| !existing.contains(id)) {
            return Err(Error::Validation(format!(
                "submission references unknown option {}",
                missing
            )));
        }

        Ok(())
    }
}

/// Loads a test's questions in position order, each joined with its options.
pub(crate) async fn load_questions(pool: &PgPool, test_id: Uuid) -> Result<Vec<LoadedQuestion>> {
    let questions = sqlx::query_as::<_, Question>(
        r#"SELECT * FROM questions WHERE test_id = $1 ORDER BY position"#,
    )
    .bind(test_id)
    .fetch_all(pool)
    .await?;

    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let mut options_by_question: HashMap<Uuid, Vec<AnswerOption>> = HashMap::new();
    let options = sqlx::query_as::<_, AnswerOption>(
        r#"SELECT * FROM options WHERE question_id = ANY($1) ORDER BY id"#,
    )
    .bind(&question_ids)
    .fetch_all(pool)
    .await?;
    for option in options {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    Ok(questions
        .into_iter()
        .map(|question| LoadedQuestion {
            options: options_by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect())
}

fn single_selection(value: &SubmittedValue) -> Option<Uuid> {
    match value {
        SubmittedValue::Text(text) => Uuid::parse_str(text).ok(),
        SubmittedValue::Selection(ids) if ids.len() == 1 => Some(ids[0]),
        _ => None,
    }
}

/// Rejects values whose shape cannot fit the question kind. Which option a
/// selection names is an answer, never a shape concern.
fn check_submitted_shape(loaded: &LoadedQuestion, submitted: Option<&SubmittedValue>) -> Result<()> {
    let Some(value) = submitted else {
        return Ok(());
    };

    let position = loaded.question.position;
    match loaded.question.kind {
        QuestionKind::Input => {
            if !matches!(value, SubmittedValue::Text(_)) {
                return Err(Error::Validation(format!(
                    "question {}: expected a text answer",
                    position
                )));
            }
        }
        QuestionKind::Radio => {
            if single_selection(value).is_none() {
                return Err(Error::Validation(format!(
                    "question {}: expected a single option id",
                    position
                )));
            }
        }
        QuestionKind::Checkbox => {
            if !matches!(value, SubmittedValue::Selection(_)) {
                return Err(Error::Validation(format!(
                    "question {}: expected a list of option ids",
                    position
                )));
            }
        }
    }

    Ok(())
}
