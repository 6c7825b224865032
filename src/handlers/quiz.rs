// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};

use crate::{
    error::AppError,
    models::{
        application::Application,
        level::EducationLevel,
        quiz::{
            AnswerDetail, GradedResultResponse, PriorResultSummary, QuizQuestion,
            StartQuizForApplicationRequest, StartQuizRequest, StartQuizResponse,
            SubmitQuizRequest,
        },
        quiz_result::{ListResultsParams, QuizResult, ResultListEntry, ResultListResponse},
    },
    services::quiz_cache,
    state::AppState,
    utils::jwt::{Claims, OptionalClaims},
};

/// Upper bound on the admin listing page size.
const MAX_PAGE_SIZE: i64 = 100;

/// Issues a quiz for the requested level (public, no auth).
///
/// Below the cache threshold this triggers AI generation; above it a
/// cached quiz is reused. Either way the caller only ever sees the
/// sanitized projection.
pub async fn start_quiz(
    State(state): State<AppState>,
    Json(req): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let level = req
        .level
        .ok_or(AppError::BadRequest("Level is required".to_string()))?;
    let level: EducationLevel = level
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid level".to_string()))?;

    let quiz = quiz_cache::get_or_create_quiz(
        &state.pool,
        state.quiz_generator.as_ref(),
        state.config.quiz_cache_threshold,
        level,
    )
    .await?;

    Ok(Json(StartQuizResponse::from_quiz(&quiz, None)))
}

/// Issues a quiz tied to an admissions application (requires auth).
///
/// The level comes from the application, not from the caller. If the
/// application already has a recorded result, the prior summary is
/// returned instead of a fresh quiz (idempotent re-entry).
pub async fn start_quiz_for_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartQuizForApplicationRequest>,
) -> Result<Response, AppError> {
    let application_id = req
        .application_id
        .ok_or(AppError::BadRequest("Application ID is required".to_string()))?;

    let application = sqlx::query_as::<_, Application>(
        r#"
        SELECT id, user_id, application_number, full_name, education_level,
               status, quiz_result_id, created_at
        FROM applications
        WHERE id = ?
        "#,
    )
    .bind(application_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Application not found".to_string()))?;

    if claims.user_id() != Some(application.user_id) {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    if let Some(existing) = find_result_for_application(&state.pool, application_id).await? {
        return Ok(Json(prior_summary(&existing)).into_response());
    }

    let level: EducationLevel = application.education_level.parse().map_err(|_| {
        AppError::InternalServerError(format!(
            "Application {} carries unknown education level '{}'",
            application.id, application.education_level
        ))
    })?;

    let quiz = quiz_cache::get_or_create_quiz(
        &state.pool,
        state.quiz_generator.as_ref(),
        state.config.quiz_cache_threshold,
        level,
    )
    .await?;

    Ok(Json(StartQuizResponse::from_quiz(&quiz, Some(application_id))).into_response())
}

/// Grades a submission and records the result.
///
/// Works for both anonymous and authenticated callers; anonymity is
/// derived from the absence of verified claims, never caller-supplied.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(OptionalClaims(claims)): Extension<OptionalClaims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<Response, AppError> {
    let (Some(quiz_id), Some(answers)) = (req.quiz_id, req.answers) else {
        return Err(AppError::BadRequest(
            "quizId and answers are required".to_string(),
        ));
    };

    let quiz = quiz_cache::get_quiz_by_id(&state.pool, quiz_id).await?;

    if answers.len() != quiz.questions.len() {
        return Err(AppError::BadRequest(format!(
            "Expected {} answers, got {}",
            quiz.questions.len(),
            answers.len()
        )));
    }

    // At most one result per application: checked up front and backed
    // by the unique index on quiz_results.application_id, so a lost
    // race surfaces the winner's result instead of a second row.
    if let Some(application_id) = req.application_id
        && let Some(existing) = find_result_for_application(&state.pool, application_id).await?
    {
        return Ok(Json(prior_summary(&existing)).into_response());
    }

    let (score, details) = grade(&quiz.questions, &answers);

    let user_id = claims.as_ref().and_then(|c| c.user_id());
    let is_anonymous = user_id.is_none();
    let completed_at = chrono::Utc::now();

    let insert = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quiz_results
            (user_id, application_id, quiz_id, level, answers, score,
             total_questions, is_anonymous, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(req.application_id)
    .bind(quiz.id)
    .bind(&quiz.level)
    .bind(SqlJson(&answers))
    .bind(score)
    .bind(quiz.questions.len() as i64)
    .bind(is_anonymous)
    .bind(completed_at)
    .fetch_one(&state.pool)
    .await;

    let result_id = match insert {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            // Concurrent submission for the same application won the race.
            let application_id = req.application_id.ok_or_else(|| AppError::from(e))?;
            let existing = find_result_for_application(&state.pool, application_id)
                .await?
                .ok_or(AppError::InternalServerError(
                    "Conflicting quiz result disappeared".to_string(),
                ))?;
            return Ok(Json(prior_summary(&existing)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(application_id) = req.application_id
        && user_id.is_some()
    {
        sqlx::query("UPDATE applications SET quiz_result_id = ? WHERE id = ?")
            .bind(result_id)
            .bind(application_id)
            .execute(&state.pool)
            .await?;
    }

    Ok(Json(GradedResultResponse {
        result_id,
        score,
        total_questions: quiz.questions.len(),
        percentage: percentage(score, quiz.questions.len() as i64),
        details,
    })
    .into_response())
}

/// Lists graded results for review (admin only).
///
/// Anonymous results are never listed. Filterable by level and score
/// range, paginated with page/limit.
pub async fn list_results(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListResultsParams>,
) -> Result<impl IntoResponse, AppError> {
    let level = params
        .level
        .as_deref()
        .map(|raw| {
            raw.parse::<EducationLevel>()
                .map_err(|_| AppError::BadRequest("Invalid level".to_string()))
        })
        .transpose()?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM quiz_results WHERE is_anonymous = 0");
    push_result_filters(&mut count_query, level, params.min_score, params.max_score);

    let total: i64 = count_query.build_query_scalar().fetch_one(&pool).await?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT r.id, r.quiz_id, r.level, r.score, r.total_questions, r.completed_at,
               u.name AS user_name, u.email AS user_email,
               r.application_id, a.application_number, a.full_name AS applicant_full_name
        FROM quiz_results r
        LEFT JOIN users u ON r.user_id = u.id
        LEFT JOIN applications a ON r.application_id = a.id
        WHERE r.is_anonymous = 0
        "#,
    );
    push_result_filters(&mut query, level, params.min_score, params.max_score);
    query.push(" ORDER BY r.completed_at DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let results: Vec<ResultListEntry> = query.build_query_as().fetch_all(&pool).await?;

    Ok(Json(ResultListResponse {
        results,
        total,
        page,
        total_pages: total_pages(total, limit),
    }))
}

fn push_result_filters(
    query: &mut QueryBuilder<Sqlite>,
    level: Option<EducationLevel>,
    min_score: Option<i64>,
    max_score: Option<i64>,
) {
    // Column names are unambiguous: only quiz_results carries level/score.
    if let Some(level) = level {
        query.push(" AND level = ");
        query.push_bind(level.as_str());
    }
    if let Some(min_score) = min_score {
        query.push(" AND score >= ");
        query.push_bind(min_score);
    }
    if let Some(max_score) = max_score {
        query.push(" AND score <= ");
        query.push_bind(max_score);
    }
}

/// Fetches the full graded detail for an application's result (admin
/// only). The breakdown is recomputed from the stored answer vector
/// against the owning quiz.
pub async fn get_result_by_application(
    State(pool): State<SqlitePool>,
    Path(application_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = find_result_for_application(&pool, application_id)
        .await?
        .ok_or(AppError::NotFound(
            "No quiz result found for this application".to_string(),
        ))?;

    let quiz = quiz_cache::get_quiz_by_id(&pool, result.quiz_id).await?;
    let (_, details) = grade(&quiz.questions, &result.answers);

    Ok(Json(serde_json::json!({
        "result": result,
        "details": details,
    })))
}

async fn find_result_for_application(
    pool: &SqlitePool,
    application_id: i64,
) -> Result<Option<QuizResult>, AppError> {
    let result = sqlx::query_as::<_, QuizResult>(
        r#"
        SELECT id, user_id, application_id, quiz_id, level, answers, score,
               total_questions, is_anonymous, completed_at
        FROM quiz_results
        WHERE application_id = ?
        "#,
    )
    .bind(application_id)
    .fetch_optional(pool)
    .await?;

    Ok(result)
}

/// Scores an answer vector against the quiz key.
///
/// A null or out-of-range answer at a position simply never matches;
/// it is scored wrong, never rejected.
fn grade(questions: &[QuizQuestion], answers: &[Option<i64>]) -> (i64, Vec<AnswerDetail>) {
    let mut score = 0;
    let details = questions
        .iter()
        .zip(answers)
        .map(|(q, &answer)| {
            let is_correct = answer == Some(q.correct_answer);
            if is_correct {
                score += 1;
            }
            AnswerDetail {
                question: q.question.clone(),
                options: q.options.clone(),
                user_answer: answer,
                correct_answer: q.correct_answer,
                is_correct,
                explanation: q.explanation.clone(),
                category: q.category.clone(),
            }
        })
        .collect();

    (score, details)
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

fn percentage(score: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as i64
}

fn prior_summary(result: &QuizResult) -> PriorResultSummary {
    PriorResultSummary {
        already_completed: true,
        result_id: result.id,
        score: result.score,
        total_questions: result.total_questions,
        percentage: percentage(result.score, result.total_questions),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}
