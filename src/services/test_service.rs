use crate::dto::test_dto::{
    CreateTestRequest, OptionDefinition, QuestionDefinition, TestDefinition,
};
use crate::error::{Error, Result};
use crate::models::option::AnswerOption;
use crate::models::question::{Question, QuestionKind};
use crate::models::test::Test;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a test together with its questions and options in one
    /// transaction. Question positions are assigned 1..N from the order of
    /// the request; a failure at any position leaves no rows behind.
    pub async fn create_test(&self, created_by: Uuid, req: CreateTestRequest) -> Result<Test> {
        req.validate()?;
        validate_questions(&req)?;

        let title = req.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let test = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO tests (title, description, created_by, show_answers)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(req.description.as_deref().map(str::trim))
        .bind(created_by)
        .bind(req.show_answers)
        .fetch_one(&mut *tx)
        .await?;

        for (idx, question) in req.questions.iter().enumerate() {
            let position = (idx as i32) + 1;
            let correct_answer = match question.kind {
                QuestionKind::Input => question.correct_answer.as_deref().map(str::trim),
                QuestionKind::Radio | QuestionKind::Checkbox => None,
            };

            let question_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO questions (test_id, question_text, kind, position, correct_answer)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(test.id)
            .bind(question.text.trim())
            .bind(question.kind)
            .bind(position)
            .bind(correct_answer)
            .fetch_one(&mut *tx)
            .await?;

            if matches!(question.kind, QuestionKind::Radio | QuestionKind::Checkbox) {
                // Flags are persisted exactly as supplied; authoring does not
                // enforce how many options an author marks correct.
                for option in &question.options {
                    sqlx::query(
                        r#"
                        INSERT INTO options (question_id, option_text, is_correct)
                        VALUES ($1, $2, $3)
                        "#,
                    )
                    .bind(question_id)
                    .bind(&option.text)
                    .bind(option.is_correct)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(test_id = %test.id, questions = req.questions.len(), "test created");
        Ok(test)
    }

    pub async fn get_test_by_id(&self, test_id: Uuid) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>(r#"SELECT * FROM tests WHERE id = $1"#)
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Test {} not found", test_id)))?;
        Ok(test)
    }

    /// The taker-facing view: questions in position order, options without
    /// their `is_correct` flags, no stored correct answers anywhere.
    pub async fn get_test_definition(&self, test_id: Uuid) -> Result<TestDefinition> {
        let test = self.get_test_by_id(test_id).await?;

        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE test_id = $1 ORDER BY position"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, AnswerOption>(
            r#"SELECT * FROM options WHERE question_id = ANY($1) ORDER BY id"#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let questions = questions
            .into_iter()
            .map(|q| QuestionDefinition {
                options: options
                    .iter()
                    .filter(|o| o.question_id == q.id)
                    .map(|o| OptionDefinition {
                        id: o.id,
                        text: o.option_text.clone(),
                    })
                    .collect(),
                id: q.id,
                position: q.position,
                text: q.question_text,
                kind: q.kind,
            })
            .collect();

        Ok(TestDefinition {
            id: test.id,
            title: test.title,
            description: test.description,
            questions,
        })
    }

    /// Storage cascades remove the test's questions, options, answers and
    /// results along with it.
    pub async fn delete_test(&self, test_id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM tests WHERE id = $1"#)
            .bind(test_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn validate_questions(req: &CreateTestRequest) -> Result<()> {
    if req.questions.is_empty() {
        return Err(Error::Validation(
            "a test needs at least one question".to_string(),
        ));
    }

    for (idx, question) in req.questions.iter().enumerate() {
        let position = idx + 1;

        if question.text.trim().is_empty() {
            return Err(Error::Validation(format!(
                "question {}: text must not be empty",
                position
            )));
        }

        if question.kind == QuestionKind::Input
            && question
                .correct_answer
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(Error::Validation(format!(
                "question {}: input questions require a correct answer",
                position
            )));
        }
    }

    Ok(())
}
