// tests/quiz_api_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use admissions_backend::{
    config::Config,
    models::{level::EducationLevel, quiz::QuizQuestion},
    routes,
    services::ai::{AiServiceError, GeneratedQuiz, QUESTIONS_PER_QUIZ, QuizGenerator},
    state::AppState,
};
use sqlx::SqlitePool;

/// Scripted stand-in for the AI backend: deterministic questions with
/// answer key `i % 4`, and a switch to simulate provider failure.
struct MockGenerator {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QuizGenerator for MockGenerator {
    async fn generate_quiz(&self, level: EducationLevel) -> Result<GeneratedQuiz, AiServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AiServiceError::RateLimited);
        }
        let questions = (0..QUESTIONS_PER_QUIZ)
            .map(|i| QuizQuestion {
                question: format!("{} question {}?", level.as_str(), i),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: (i % 4) as i64,
                explanation: format!("Option {} is right.", i % 4),
                category: "Grammar".to_string(),
            })
            .collect();
        Ok(GeneratedQuiz { questions, usage: None })
    }
}

/// Answer key matching `MockGenerator`.
fn correct_answers() -> Vec<i64> {
    (0..QUESTIONS_PER_QUIZ).map(|i| (i % 4) as i64).collect()
}

/// Spawns the app on a random port against a fresh in-memory database.
/// Returns the base URL, the pool for direct inspection and the mock
/// generator handle.
async fn spawn_app(threshold: i64) -> (String, SqlitePool, Arc<MockGenerator>) {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        gemini_api_key: None,
        openai_api_key: None,
        ai_model: None,
        ai_timeout_secs: 5,
        quiz_cache_threshold: threshold,
        admin_email: None,
        admin_password: None,
    };

    let generator = MockGenerator::new();

    let state = AppState {
        pool: pool.clone(),
        config,
        quiz_generator: generator.clone(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool, generator)
}

async fn start_quiz(client: &reqwest::Client, address: &str, level: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/quiz/start", address))
        .json(&serde_json::json!({ "level": level }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn health_check_works() {
    let (address, _pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn start_quiz_generates_sanitized_quiz_and_persists_it() {
    let (address, pool, generator) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let response = start_quiz(&client, &address, "Lớp 5").await;
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.unwrap();
    // The sanitized projection must never carry the answer key.
    assert!(!body.contains("correctAnswer"));
    assert!(!body.contains("explanation"));

    let quiz: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(quiz["level"], "Lớp 5");
    assert_eq!(quiz["totalQuestions"], 20);
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 20);
    assert_eq!(quiz["questions"][0]["id"], 0);
    assert_eq!(quiz["questions"][0]["options"].as_array().unwrap().len(), 4);

    assert_eq!(generator.calls(), 1);

    let (count, generated_by): (i64, String) =
        sqlx::query_as("SELECT COUNT(*), MAX(generated_by) FROM quizzes WHERE level = 'Lớp 5'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
    assert_eq!(generated_by, "ai");
}

#[tokio::test]
async fn start_quiz_validates_level() {
    let (address, _pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("{}/api/quiz/start", address))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 400);

    let unknown = start_quiz(&client, &address, "Lớp 99").await;
    assert_eq!(unknown.status().as_u16(), 400);
}

#[tokio::test]
async fn cache_threshold_suppresses_generation() {
    let (address, pool, generator) = spawn_app(2).await;
    let client = reqwest::Client::new();

    for _ in 0..12 {
        let response = start_quiz(&client, &address, "TOEIC").await;
        assert_eq!(response.status().as_u16(), 200);
    }

    // Two generations fill the level to the threshold; everything after
    // is served from the cache.
    assert_eq!(generator.calls(), 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE level = 'TOEIC'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn generation_failure_falls_back_to_cached_quiz() {
    let (address, _pool, generator) = spawn_app(10).await;
    let client = reqwest::Client::new();

    assert_eq!(start_quiz(&client, &address, "Lớp 1").await.status().as_u16(), 200);

    generator.set_failing(true);
    let response = start_quiz(&client, &address, "Lớp 1").await;
    assert_eq!(response.status().as_u16(), 200);

    let quiz: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quiz["totalQuestions"], 20);
}

#[tokio::test]
async fn generation_failure_with_empty_cache_is_service_unavailable() {
    let (address, pool, generator) = spawn_app(10).await;
    let client = reqwest::Client::new();
    generator.set_failing(true);

    let response = start_quiz(&client, &address, "Đại học").await;
    assert_eq!(response.status().as_u16(), 503);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn submitting_all_correct_answers_scores_full_marks() {
    let (address, _pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let quiz: serde_json::Value = start_quiz(&client, &address, "Lớp 7").await.json().await.unwrap();
    let quiz_id = quiz["quizId"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .json(&serde_json::json!({ "quizId": quiz_id, "answers": correct_answers() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 20);
    assert_eq!(result["totalQuestions"], 20);
    assert_eq!(result["percentage"], 100);

    let details = result["details"].as_array().unwrap();
    assert_eq!(details.len(), 20);
    assert!(details.iter().all(|d| d["isCorrect"] == true));
    // The submitter gets the key and explanations back.
    assert_eq!(details[1]["correctAnswer"], 1);
    assert!(details[0]["explanation"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn null_and_wrong_answers_are_scored_not_rejected() {
    let (address, _pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let quiz: serde_json::Value = start_quiz(&client, &address, "Lớp 8").await.json().await.unwrap();
    let quiz_id = quiz["quizId"].as_i64().unwrap();

    // First answer correct (key 0), the rest null or out of range.
    let mut answers: Vec<serde_json::Value> = vec![serde_json::json!(0)];
    answers.extend((1..20).map(|i| {
        if i % 2 == 0 {
            serde_json::Value::Null
        } else {
            serde_json::json!(77)
        }
    }));

    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .json(&serde_json::json!({ "quizId": quiz_id, "answers": answers }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(result["details"][2]["userAnswer"], serde_json::Value::Null);
    assert_eq!(result["details"][2]["isCorrect"], false);
}

#[tokio::test]
async fn answer_count_mismatch_is_rejected_without_persisting() {
    let (address, pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let quiz: serde_json::Value = start_quiz(&client, &address, "Lớp 2").await.json().await.unwrap();
    let quiz_id = quiz["quizId"].as_i64().unwrap();

    let nineteen: Vec<i64> = correct_answers().into_iter().take(19).collect();
    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .json(&serde_json::json!({ "quizId": quiz_id, "answers": nineteen }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_results")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn submit_requires_quiz_id_and_answers() {
    let (address, _pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .json(&serde_json::json!({ "answers": correct_answers() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn submitting_against_unknown_quiz_is_not_found() {
    let (address, _pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .json(&serde_json::json!({ "quizId": 4242, "answers": correct_answers() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn anonymous_submission_is_flagged_and_unowned() {
    let (address, pool, _gen) = spawn_app(10).await;
    let client = reqwest::Client::new();

    let quiz: serde_json::Value = start_quiz(&client, &address, "Lớp 9").await.json().await.unwrap();
    let quiz_id = quiz["quizId"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/quiz/submit", address))
        .json(&serde_json::json!({ "quizId": quiz_id, "answers": correct_answers() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (is_anonymous, user_id): (bool, Option<i64>) =
        sqlx::query_as("SELECT is_anonymous, user_id FROM quiz_results")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(is_anonymous);
    assert_eq!(user_id, None);
}
