use std::time::Duration;

use dossier_core::error::AppError;
use dossier_core::models::ProfileRecord;
use dossier_core::traits::IndustryClassifier;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_SYSTEM_PROMPT: &str = "You classify professional profiles by industry. Given a profile as JSON, answer with the single industry the person works in, using a short conventional label such as \"Software Development\" or \"Financial Services\". Respond ONLY with JSON of the form {\"industry\": \"...\"}, or {\"industry\": null} when the profile gives no signal.";

/// OpenAI-compatible LLM client that labels a profile with an industry.
///
/// Works with any OpenAI-compatible API, including:
/// - OpenAI directly (`https://api.openai.com/v1`)
/// - Gemini via compatibility layer (`https://generativelanguage.googleapis.com/v1beta/openai`)
#[derive(Clone)]
pub struct OpenAiIndustryClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl OpenAiIndustryClassifier {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(api_key, model, base_url, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        let prompt = self.system_prompt.clone();
        Ok(Self::build(&self.api_key, &self.model, &self.base_url, timeout)?.with_system_prompt(prompt))
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn build(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }

    fn request(&self, profile: &ProfileRecord) -> Result<ChatRequest, AppError> {
        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!("Profile:\n```json\n{}\n```", profile.to_json()?),
                },
            ],
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        })
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct IndustryAnswer {
    industry: Option<String>,
}

/// Pull the label out of the model's JSON answer. Blank labels count as none.
fn parse_answer(content: &str) -> Result<Option<String>, AppError> {
    let answer: IndustryAnswer = serde_json::from_str(content.trim()).map_err(|e| AppError::LlmError {
        message: format!("LLM returned invalid JSON: {e}. Raw: {content}"),
        status_code: 200,
        retryable: false,
    })?;
    Ok(answer
        .industry
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

impl IndustryClassifier for OpenAiIndustryClassifier {
    async fn classify(&self, profile: &ProfileRecord) -> Result<Option<String>, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.request(profile)?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::HttpError(format!("Request timed out: {e}"))
                } else if e.is_connect() {
                    AppError::HttpError(format!("Connection failed: {e}"))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status_code, body));

            return Err(AppError::LlmError {
                message,
                status_code,
                retryable: status_code == 429 || status_code >= 500,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse LLM response: {}", e)))?;

        let content = chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| AppError::LlmError {
                message: "Empty response from LLM".into(),
                status_code: 200,
                retryable: false,
            })?;

        let industry = parse_answer(content)?;
        tracing::debug!(model = %self.model, industry = ?industry, "Classified profile industry");
        Ok(industry)
    }
}
