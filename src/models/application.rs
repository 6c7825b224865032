// src/models/application.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'applications' table, trimmed to the fields the quiz
/// subsystem reads: owner, education level and the back-link to a
/// completed quiz result.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub user_id: i64,
    pub application_number: String,
    pub full_name: String,
    pub education_level: String,
    pub status: String,
    pub quiz_result_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new application.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1, max = 200, message = "Full name is required."))]
    pub full_name: String,
    pub education_level: String,
}
