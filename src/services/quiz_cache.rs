// src/services/quiz_cache.rs

use rand::Rng;
use sqlx::{SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::{level::EducationLevel, quiz::Quiz},
    services::ai::QuizGenerator,
};

/// Returns a quiz for the level, generating one only while the cached
/// pool for that level is below `threshold`.
///
/// Once a level holds `threshold` quizzes, requests are served by a
/// uniformly random pick from the existing set, bounding AI spend. A
/// failed generation falls back to the same random pick when at least
/// one quiz exists; with an empty pool the request surfaces as 503.
///
/// There is no per-level lock: concurrent below-threshold callers may
/// each trigger a generation and both quizzes are kept. The threshold
/// is advisory, not a hard cap.
pub async fn get_or_create_quiz(
    pool: &SqlitePool,
    generator: &dyn QuizGenerator,
    threshold: i64,
    level: EducationLevel,
) -> Result<Quiz, AppError> {
    let count = count_quizzes_for_level(pool, level).await?;

    if count >= threshold {
        return pick_random_quiz(pool, level, count).await;
    }

    match generator.generate_quiz(level).await {
        Ok(generated) => {
            let quiz = sqlx::query_as::<_, Quiz>(
                r#"
                INSERT INTO quizzes (level, questions, generated_by, created_at)
                VALUES (?, ?, 'ai', ?)
                RETURNING id, level, questions, generated_by, created_at
                "#,
            )
            .bind(level.as_str())
            .bind(Json(generated.questions))
            .bind(chrono::Utc::now())
            .fetch_one(pool)
            .await?;

            tracing::info!(level = %level, quiz_id = quiz.id, "Cached new AI-generated quiz");
            Ok(quiz)
        }
        Err(ai_err) if count > 0 => {
            // Trade content repetition for availability.
            tracing::warn!(level = %level, error = %ai_err, "AI generation failed, serving cached quiz");
            pick_random_quiz(pool, level, count).await
        }
        Err(ai_err) => {
            tracing::error!(level = %level, error = %ai_err, "AI generation failed with empty cache");
            Err(AppError::ServiceUnavailable(format!(
                "Unable to generate quiz: {}",
                ai_err
            )))
        }
    }
}

/// Uniformly random pick implemented as a random-offset skip over the
/// level's quiz set.
async fn pick_random_quiz(
    pool: &SqlitePool,
    level: EducationLevel,
    count: i64,
) -> Result<Quiz, AppError> {
    let offset = {
        let mut rng = rand::thread_rng();
        rng.gen_range(0..count)
    };

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, level, questions, generated_by, created_at
        FROM quizzes
        WHERE level = ?
        LIMIT 1 OFFSET ?
        "#,
    )
    .bind(level.as_str())
    .bind(offset)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(quiz)
}

pub async fn count_quizzes_for_level(
    pool: &SqlitePool,
    level: EducationLevel,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE level = ?")
        .bind(level.as_str())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn get_quiz_by_id(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, level, questions, generated_by, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(quiz)
}
