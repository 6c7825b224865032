// src/handlers/application.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        application::{Application, CreateApplicationRequest},
        level::EducationLevel,
    },
    utils::jwt::Claims,
};

/// Creates an admissions application for the logged-in user.
pub async fn create_application(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateApplicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let level: EducationLevel = payload
        .education_level
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid education level".to_string()))?;

    let user_id = claims
        .user_id()
        .ok_or(AppError::AuthError("Invalid token subject".to_string()))?;

    let now = chrono::Utc::now();
    let application_number = generate_application_number(&now);

    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications
            (user_id, application_number, full_name, education_level, status, created_at)
        VALUES (?, ?, ?, ?, 'pending', ?)
        RETURNING id, user_id, application_number, full_name, education_level,
                  status, quiz_result_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(&application_number)
    .bind(&payload.full_name)
    .bind(level.as_str())
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create application: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// Fetches a single application. Owner or admin only.
pub async fn get_application(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let application = sqlx::query_as::<_, Application>(
        r#"
        SELECT id, user_id, application_number, full_name, education_level,
               status, quiz_result_id, created_at
        FROM applications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Application not found".to_string()))?;

    if claims.user_id() != Some(application.user_id) && claims.role != "admin" {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    Ok(Json(application))
}

/// Application numbers are informational, not sequential:
/// APP-<year>-<creation timestamp in nanoseconds>.
fn generate_application_number(now: &chrono::DateTime<chrono::Utc>) -> String {
    use chrono::Datelike;
    format!(
        "APP-{}-{}",
        now.year(),
        now.timestamp_nanos_opt().unwrap_or_default()
    )
}
