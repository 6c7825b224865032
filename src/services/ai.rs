// src/services/ai.rs

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    models::{level::EducationLevel, quiz::QuizQuestion},
    services::prompts,
};

/// Structural contract for generated quizzes.
pub const QUESTIONS_PER_QUIZ: usize = 20;
pub const OPTIONS_PER_QUESTION: usize = 4;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";

/// Failure of the AI generation pipeline: provider errors, timeouts and
/// structurally invalid output. Never retried in place; the quiz cache
/// decides whether a cached quiz can substitute.
#[derive(Debug)]
pub enum AiServiceError {
    /// Neither provider credential is configured. Fatal at startup.
    Configuration(String),
    /// Provider reported a quota or rate-limit condition.
    RateLimited,
    /// The provider call exceeded the configured deadline.
    Timeout,
    /// The provider returned no usable text.
    EmptyResponse,
    /// The returned payload violated the quiz contract.
    InvalidResponse(String),
    /// Transport or provider-side failure.
    Provider(String),
}

impl fmt::Display for AiServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiServiceError::Configuration(msg) => write!(f, "AI configuration error: {}", msg),
            AiServiceError::RateLimited => {
                write!(f, "AI service rate limit exceeded. Please try again later.")
            }
            AiServiceError::Timeout => write!(f, "AI service timed out"),
            AiServiceError::EmptyResponse => write!(f, "Empty response from AI service"),
            AiServiceError::InvalidResponse(msg) => write!(f, "Invalid quiz response: {}", msg),
            AiServiceError::Provider(msg) => write!(f, "AI provider error: {}", msg),
        }
    }
}

impl std::error::Error for AiServiceError {}

impl From<reqwest::Error> for AiServiceError {
    fn from(err: reqwest::Error) -> Self {
        AiServiceError::Provider(err.to_string())
    }
}

/// Token accounting reported by the provider, when available.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// A validated quiz fresh out of the generation pipeline.
#[derive(Debug)]
pub struct GeneratedQuiz {
    pub questions: Vec<QuizQuestion>,
    pub usage: Option<TokenUsage>,
}

/// Seam between the quiz cache and the AI backend, so tests can swap in
/// a scripted generator.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate_quiz(&self, level: EducationLevel) -> Result<GeneratedQuiz, AiServiceError>;
}

/// One backend is selected at construction and never re-chosen.
#[derive(Debug, Clone)]
enum Provider {
    Gemini { api_key: String },
    OpenAi { api_key: String },
}

/// Production `QuizGenerator` speaking to either the Gemini or the
/// OpenAI REST API.
pub struct AiService {
    client: reqwest::Client,
    provider: Provider,
    model: String,
    timeout: Duration,
}

impl AiService {
    /// Selects the backend from configuration. Gemini wins when both
    /// keys are present; neither key is a fatal configuration error.
    pub fn from_config(config: &Config) -> Result<Self, AiServiceError> {
        let (provider, default_model) = if let Some(key) = &config.gemini_api_key {
            (Provider::Gemini { api_key: key.clone() }, DEFAULT_GEMINI_MODEL)
        } else if let Some(key) = &config.openai_api_key {
            (Provider::OpenAi { api_key: key.clone() }, DEFAULT_OPENAI_MODEL)
        } else {
            return Err(AiServiceError::Configuration(
                "Either GEMINI_API_KEY or OPENAI_API_KEY must be set".to_string(),
            ));
        };

        let model = config
            .ai_model
            .clone()
            .unwrap_or_else(|| default_model.to_string());

        match &provider {
            Provider::Gemini { .. } => {
                tracing::info!("Using Gemini AI provider with model: {}", model)
            }
            Provider::OpenAi { .. } => {
                tracing::info!("Using OpenAI provider with model: {}", model)
            }
        }

        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            model,
            timeout: Duration::from_secs(config.ai_timeout_secs),
        })
    }

    async fn call_provider(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<(String, Option<TokenUsage>), AiServiceError> {
        let call = async {
            match &self.provider {
                Provider::Gemini { api_key } => {
                    self.call_gemini(api_key, system_prompt, user_prompt).await
                }
                Provider::OpenAi { api_key } => {
                    self.call_openai(api_key, system_prompt, user_prompt).await
                }
            }
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AiServiceError::Timeout)?
    }

    async fn call_gemini(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<(String, Option<TokenUsage>), AiServiceError> {
        // Gemini takes a single prompt; the system instruction is
        // prepended to the user instruction.
        let full_prompt = format!("{}\n\n{}", system_prompt, user_prompt);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: full_prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.4,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
                response_mime_type: "application/json".to_string(),
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, api_key
        );

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || body.contains("quota") {
                return Err(AiServiceError::RateLimited);
            }
            return Err(AiServiceError::Provider(format!(
                "Gemini request failed with status {}: {}",
                status, body
            )));
        }

        let gemini: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiServiceError::Provider(e.to_string()))?;

        let text = gemini
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(AiServiceError::EmptyResponse)?;

        let usage = gemini.usage_metadata.map(|m| TokenUsage {
            prompt_tokens: m.prompt_token_count,
            completion_tokens: m.candidates_token_count,
            total_tokens: m.total_token_count,
        });

        Ok((text, usage))
    }

    async fn call_openai(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<(String, Option<TokenUsage>), AiServiceError> {
        let request = OpenAiChatRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            response_format: OpenAiResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", OPENAI_BASE_URL))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || body.contains("quota") {
                return Err(AiServiceError::RateLimited);
            }
            return Err(AiServiceError::Provider(format!(
                "OpenAI request failed with status {}: {}",
                status, body
            )));
        }

        let chat: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|e| AiServiceError::Provider(e.to_string()))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or(AiServiceError::EmptyResponse)?;

        let usage = chat.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok((text, usage))
    }
}

#[async_trait]
impl QuizGenerator for AiService {
    async fn generate_quiz(&self, level: EducationLevel) -> Result<GeneratedQuiz, AiServiceError> {
        let system_prompt = prompts::quiz_system_prompt();
        let user_prompt = prompts::quiz_user_prompt(level);

        let (text, usage) = self.call_provider(system_prompt, &user_prompt).await?;

        if let Some(usage) = &usage {
            tracing::info!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "AI token usage"
            );
        }

        let payload: Value = serde_json::from_str(&text).map_err(|e| {
            AiServiceError::InvalidResponse(format!("response is not valid JSON: {}", e))
        })?;

        let questions = validate_generated_quiz(&payload)?;

        tracing::info!(level = %level, "AI quiz generation completed");

        Ok(GeneratedQuiz { questions, usage })
    }
}

/// Enforces the structural contract on a raw AI payload before anything
/// is persisted: a `questions` array of exactly 20 entries, each with
/// non-empty text fields, exactly 4 non-empty options and an integer
/// correctAnswer in [0, 3].
///
/// The category value is checked for presence only, not against the
/// closed category set.
pub fn validate_generated_quiz(payload: &Value) -> Result<Vec<QuizQuestion>, AiServiceError> {
    let questions = payload
        .get("questions")
        .and_then(|q| q.as_array())
        .ok_or_else(|| {
            AiServiceError::InvalidResponse("missing questions array".to_string())
        })?;

    if questions.len() != QUESTIONS_PER_QUIZ {
        return Err(AiServiceError::InvalidResponse(format!(
            "expected {} questions, got {}",
            QUESTIONS_PER_QUIZ,
            questions.len()
        )));
    }

    let mut validated = Vec::with_capacity(QUESTIONS_PER_QUIZ);

    for (idx, raw) in questions.iter().enumerate() {
        validated.push(validate_question(raw).map_err(|reason| {
            AiServiceError::InvalidResponse(format!("question {}: {}", idx, reason))
        })?);
    }

    Ok(validated)
}

fn validate_question(raw: &Value) -> Result<QuizQuestion, String> {
    let question = non_empty_str(raw, "question")?;

    let options = raw
        .get("options")
        .and_then(|o| o.as_array())
        .ok_or("missing options array")?;

    if options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "expected {} options, got {}",
            OPTIONS_PER_QUESTION,
            options.len()
        ));
    }

    let options: Vec<String> = options
        .iter()
        .map(|o| {
            o.as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .ok_or("empty or non-text option".to_string())
        })
        .collect::<Result<_, _>>()?;

    let correct_answer = raw
        .get("correctAnswer")
        .and_then(|c| c.as_i64())
        .ok_or("correctAnswer is not an integer")?;

    if !(0..OPTIONS_PER_QUESTION as i64).contains(&correct_answer) {
        return Err(format!("correctAnswer {} out of range", correct_answer));
    }

    let explanation = non_empty_str(raw, "explanation")?;
    let category = non_empty_str(raw, "category")?;

    Ok(QuizQuestion {
        question,
        options,
        correct_answer,
        explanation,
        category,
    })
}

fn non_empty_str(raw: &Value, field: &str) -> Result<String, String> {
    raw.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("missing or empty {}", field))
}

// Gemini wire types.

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: i64,
    #[serde(default)]
    candidates_token_count: i64,
    #[serde(default)]
    total_token_count: i64,
}

// OpenAI wire types.

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    response_format: OpenAiResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: i64,
    completion_tokens: i64,
    total_tokens: i64,
}
