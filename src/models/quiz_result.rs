// src/models/quiz_result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'quiz_results' table.
///
/// `user_id` is null for anonymous submissions; `application_id` is set
/// only when the result is linked to an admissions application (at most
/// one result per application, backed by a unique index).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: Option<i64>,
    pub application_id: Option<i64>,
    pub quiz_id: i64,
    pub level: String,
    /// Submitted answer vector, same length as the quiz. Null entries
    /// are skipped questions.
    pub answers: Json<Vec<Option<i64>>>,
    pub score: i64,
    pub total_questions: i64,
    pub is_anonymous: bool,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for the admin results listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResultsParams {
    pub level: Option<String>,
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A listed result row joined with its user and application, for the
/// admin review table.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultListEntry {
    pub id: i64,
    pub quiz_id: i64,
    pub level: String,
    pub score: i64,
    pub total_questions: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub application_id: Option<i64>,
    pub application_number: Option<String>,
    pub applicant_full_name: Option<String>,
}

/// Paginated envelope for the admin results listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultListResponse {
    pub results: Vec<ResultListEntry>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}
