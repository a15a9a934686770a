use serde::Deserialize;
use thiserror::Error;

/// Why a single translation attempt produced nothing usable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationFailure {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("response contained no choices")]
    NoChoices,

    #[error("response content was empty")]
    EmptyContent,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatMessage>,

    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    /// Providers send either a string (`"rate_limit_exceeded"`) or a number here.
    #[serde(default)]
    pub code: Option<serde_json::Value>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    pub fn code_string(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "unknown".to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn into_failure(self) -> TranslationFailure {
        TranslationFailure::Api {
            code: self.code_string(),
            message: self.message.unwrap_or_default(),
        }
    }
}
