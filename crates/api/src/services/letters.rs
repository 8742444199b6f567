//! Birthday letter generation through an OpenAI-compatible chat completion API.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LettersConfig;
use crate::error::ApiError;
use domain::models::GenerateLetterRequest;

/// Letter generation failures.
#[derive(Debug, Error)]
pub enum LetterError {
    #[error("Letter generation is not configured: set letters.api_key")]
    MissingApiKey,

    #[error("Request to letter provider failed: {0}")]
    RequestFailed(String),

    #[error("Letter provider rate limited the request")]
    RateLimited,

    #[error("Letter provider rejected the API key")]
    Unauthorized,

    #[error("Letter provider error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Could not parse letter provider response: {0}")]
    ResponseParseFailed(String),

    #[error("Letter provider returned no text")]
    EmptyResponse,
}

impl From<LetterError> for ApiError {
    fn from(err: LetterError) -> Self {
        match err {
            LetterError::MissingApiKey => ApiError::Configuration(err.to_string()),
            LetterError::RateLimited => ApiError::ServiceUnavailable(err.to_string()),
            LetterError::RequestFailed(_) => ApiError::ServiceUnavailable(err.to_string()),
            LetterError::Unauthorized
            | LetterError::ApiError { .. }
            | LetterError::ResponseParseFailed(_)
            | LetterError::EmptyResponse => ApiError::Internal(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_letter(self) -> Result<String, LetterError> {
        self.choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or(LetterError::EmptyResponse)
    }
}

/// Chat completion client for letters.
#[derive(Clone)]
pub struct LetterClient {
    client: Client,
    config: LettersConfig,
}

impl LetterClient {
    pub fn new(config: LettersConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    /// True when an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    /// Generates a letter and returns its trimmed text.
    pub async fn generate(&self, request: &GenerateLetterRequest) -> Result<String, LetterError> {
        if !self.is_configured() {
            return Err(LetterError::MissingApiKey);
        }

        let prompt = request.build_prompt();
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| LetterError::RequestFailed(e.to_string()))?;

        let letter = match response.status() {
            StatusCode::OK => response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|e| LetterError::ResponseParseFailed(e.to_string()))?
                .into_letter()?,
            StatusCode::TOO_MANY_REQUESTS => return Err(LetterError::RateLimited),
            StatusCode::UNAUTHORIZED => return Err(LetterError::Unauthorized),
            status => {
                let message = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), "Letter provider error");
                return Err(LetterError::ApiError {
                    status: status.as_u16(),
                    message,
                });
            }
        };

        info!(
            model = %self.config.model,
            style = ?request.style,
            letter_chars = letter.chars().count(),
            "Birthday letter generated"
        );
        Ok(letter)
    }
}
