// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// A single multiple-choice question as stored inside a quiz.
///
/// Field names are camelCase on the wire because this is also the exact
/// shape the AI backends are instructed to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    /// Exactly 4 options; enforced by the generation validator.
    pub options: Vec<String>,
    /// Index into `options`, in [0, 3].
    pub correct_answer: i64,
    pub explanation: String,
    pub category: String,
}

/// Represents the 'quizzes' table. Immutable once inserted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub level: String,
    /// JSON array of exactly 20 questions.
    pub questions: Json<Vec<QuizQuestion>>,
    /// 'ai' or 'manual'.
    pub generated_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for requesting a public (anonymous) quiz.
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub level: Option<String>,
}

/// DTO for requesting a quiz tied to an application.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizForApplicationRequest {
    pub application_id: Option<i64>,
}

/// Question projection safe to hand to an untrusted caller.
/// Deliberately a separate type: `correct_answer` and `explanation`
/// have no field here, so they can never leak through serialization.
#[derive(Debug, Serialize)]
pub struct SanitizedQuestion {
    /// Ordinal position within the quiz.
    pub id: usize,
    pub question: String,
    pub options: Vec<String>,
    pub category: String,
}

/// DTO returned by the start endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizResponse {
    pub quiz_id: i64,
    pub level: String,
    pub total_questions: usize,
    pub questions: Vec<SanitizedQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<i64>,
}

impl StartQuizResponse {
    /// Builds the sanitized projection of a stored quiz.
    pub fn from_quiz(quiz: &Quiz, application_id: Option<i64>) -> Self {
        let questions = quiz
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| SanitizedQuestion {
                id: idx,
                question: q.question.clone(),
                options: q.options.clone(),
                category: q.category.clone(),
            })
            .collect();

        StartQuizResponse {
            quiz_id: quiz.id,
            level: quiz.level.clone(),
            total_questions: quiz.questions.len(),
            questions,
            application_id,
        }
    }
}

/// DTO for submitting answers.
///
/// Answers are nullable on purpose: a skipped question arrives as JSON
/// null and is simply graded as wrong.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub quiz_id: Option<i64>,
    pub answers: Option<Vec<Option<i64>>>,
    pub application_id: Option<i64>,
}

/// Per-question grading breakdown, only ever returned to the submitter
/// of that exact submission or to an administrator.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question: String,
    pub options: Vec<String>,
    pub user_answer: Option<i64>,
    pub correct_answer: i64,
    pub is_correct: bool,
    pub explanation: String,
    pub category: String,
}

/// DTO returned after grading a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResultResponse {
    pub result_id: i64,
    pub score: i64,
    pub total_questions: usize,
    pub percentage: i64,
    pub details: Vec<AnswerDetail>,
}

/// Summary returned when an application already has a recorded result.
/// Re-entry is idempotent, not an error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorResultSummary {
    pub already_completed: bool,
    pub result_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
}
