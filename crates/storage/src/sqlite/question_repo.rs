use std::collections::BTreeMap;

use drill_core::model::{
    AnswerChoice, KindFilter, Question, QuestionCount, QuestionId, ThemeSelection,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::warn;
use url::Url;

use super::SqliteRepository;
use super::mapping::{answer_id_from_i64, id_i64, kind_from_str, question_id_from_i64, ser};
use crate::repository::{QuestionRepository, StorageError};

struct QuestionRow {
    id: QuestionId,
    theme: String,
    sub_theme: String,
    prompt: String,
    image_url: Option<String>,
    kind: String,
    explanation: Option<String>,
    difficulty: Option<i64>,
    point_weight: Option<f64>,
}

fn map_question_row(row: &SqliteRow) -> Result<QuestionRow, StorageError> {
    Ok(QuestionRow {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        theme: row.try_get("theme").map_err(ser)?,
        sub_theme: row.try_get("sub_theme").map_err(ser)?,
        prompt: row.try_get("prompt").map_err(ser)?,
        image_url: row.try_get("image_url").map_err(ser)?,
        kind: row.try_get("kind").map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        point_weight: row.try_get("point_weight").map_err(ser)?,
    })
}

fn map_choice_row(row: &SqliteRow) -> Result<AnswerChoice, StorageError> {
    let id = answer_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let text: String = row.try_get("text").map_err(ser)?;
    let is_correct: bool = row.try_get("is_correct").map_err(ser)?;
    Ok(AnswerChoice::new(id, text, is_correct))
}

impl QuestionRow {
    /// Rebuild the validated domain question from its row plus choices.
    fn into_question(self, answers: Vec<AnswerChoice>) -> Result<Question, StorageError> {
        let kind = kind_from_str(&self.kind)?;
        let image = match self.image_url {
            Some(raw) => Some(Url::parse(&raw).map_err(ser)?),
            None => None,
        };
        let difficulty = self
            .difficulty
            .map(|d| u8::try_from(d).map_err(ser))
            .transpose()?;

        Question::new(
            self.id,
            self.theme,
            self.sub_theme,
            self.prompt,
            image,
            answers,
            kind,
            self.explanation,
            difficulty,
            self.point_weight,
        )
        .map_err(ser)
    }
}

impl SqliteRepository {
    async fn question_rows_for(
        &self,
        selection: &ThemeSelection,
    ) -> Result<Vec<QuestionRow>, StorageError> {
        const BASE: &str = r"
            SELECT id, theme, sub_theme, prompt, image_url, kind,
                   explanation, difficulty, point_weight
            FROM questions
        ";

        let mut rows = Vec::new();
        if selection.sub_themes.is_empty() {
            let fetched = sqlx::query(&format!("{BASE} WHERE theme = ?1 ORDER BY id"))
                .bind(&selection.theme)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            for row in &fetched {
                rows.push(map_question_row(row)?);
            }
        } else {
            for sub_theme in &selection.sub_themes {
                let fetched = sqlx::query(&format!(
                    "{BASE} WHERE theme = ?1 AND sub_theme = ?2 ORDER BY id"
                ))
                .bind(&selection.theme)
                .bind(sub_theme)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
                for row in &fetched {
                    rows.push(map_question_row(row)?);
                }
            }
        }
        Ok(rows)
    }

    async fn choices_for(&self, question_id: QuestionId) -> Result<Vec<AnswerChoice>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, text, is_correct
                FROM answer_choices
                WHERE question_id = ?1
                ORDER BY position
            ",
        )
        .bind(id_i64("question_id", question_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_choice_row).collect()
    }
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let question_id = id_i64("question_id", question.id().value())?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO questions (
                    id, theme, sub_theme, prompt, image_url, kind,
                    explanation, difficulty, point_weight
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT (id) DO UPDATE SET
                    theme = excluded.theme,
                    sub_theme = excluded.sub_theme,
                    prompt = excluded.prompt,
                    image_url = excluded.image_url,
                    kind = excluded.kind,
                    explanation = excluded.explanation,
                    difficulty = excluded.difficulty,
                    point_weight = excluded.point_weight
            ",
        )
        .bind(question_id)
        .bind(question.theme())
        .bind(question.sub_theme())
        .bind(question.prompt())
        .bind(question.image().map(Url::as_str))
        .bind(question.kind().as_str())
        .bind(question.explanation())
        .bind(question.difficulty().map(i64::from))
        .bind(question.point_weight())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM answer_choices WHERE question_id = ?1")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, choice) in question.answers().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO answer_choices (question_id, id, position, text, is_correct)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(question_id)
            .bind(id_i64("answer_id", choice.id.value())?)
            .bind(i64::try_from(position).map_err(ser)?)
            .bind(&choice.text)
            .bind(choice.is_correct)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn fetch_questions(
        &self,
        themes: &[ThemeSelection],
        count: QuestionCount,
        kinds: KindFilter,
    ) -> Result<Vec<Question>, StorageError> {
        // Overlapping selections may match the same question twice; the map
        // dedupes and keeps the output ordered by id.
        let mut rows: BTreeMap<QuestionId, QuestionRow> = BTreeMap::new();
        for selection in themes {
            for row in self.question_rows_for(selection).await? {
                rows.entry(row.id).or_insert(row);
            }
        }

        let mut questions = Vec::new();
        for (id, row) in rows {
            let choices = self.choices_for(id).await?;
            match row.into_question(choices) {
                Ok(question) if kinds.matches(question.kind()) => questions.push(question),
                Ok(_) => {}
                Err(err) => {
                    warn!(%id, error = %err, "skipping question that failed validation");
                }
            }

            if let Some(limit) = count.limit() {
                if questions.len() >= usize::try_from(limit).unwrap_or(usize::MAX) {
                    break;
                }
            }
        }

        Ok(questions)
    }
}
