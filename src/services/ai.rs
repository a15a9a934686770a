use std::sync::LazyLock;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::config::AppConfig;
use crate::services::ai_types::{ChatResponse, TranslationFailure};

pub const TEMPERATURE: f32 = 0.5;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\[\]\r\n]+\]|\{[^{}\r\n]+\}").expect("token pattern is valid")
});

/// One translation attempt. Every failure comes back as a value.
pub trait Translate {
    fn translate(
        &self,
        text: &str,
        target_lang: &str,
        hint: Option<&str>,
    ) -> std::result::Result<String, TranslationFailure>;
}

pub struct AiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let client = Client::builder().timeout(cfg.timeout()).build()?;

        Ok(AiClient {
            client,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

impl Translate for AiClient {
    fn translate(
        &self,
        text: &str,
        target_lang: &str,
        hint: Option<&str>,
    ) -> std::result::Result<String, TranslationFailure> {
        let prompt = build_prompt(text, target_lang, hint);

        let body = request_body(&self.model, &prompt);

        let result = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| TranslationFailure::Transport(e.to_string()))
            .and_then(|resp| {
                let status = resp.status();
                // Read as text first so the error body is not lost when JSON parsing fails.
                let text = resp
                    .text()
                    .map_err(|e| TranslationFailure::Transport(e.to_string()))?;
                interpret_response(status, &text)
            });

        match &result {
            Ok(t) => debug!(chars = t.chars().count(), "translation received"),
            Err(TranslationFailure::Api { code, message }) => {
                warn!(code = %code, message = %message, "translation API reported an error")
            }
            Err(e) => warn!(error = %e, "translation request failed"),
        }

        result
    }
}

/// Chat-completion request: one user message at the fixed temperature.
pub fn request_body(model: &str, prompt: &str) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [
            { "role": "user", "content": prompt }
        ],
        "temperature": TEMPERATURE
    })
}

pub fn interpret_response(
    status: StatusCode,
    body: &str,
) -> std::result::Result<String, TranslationFailure> {
    if !status.is_success() {
        return Err(TranslationFailure::Http {
            status: status.as_u16(),
            message: extract_error_message(body),
        });
    }

    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| TranslationFailure::InvalidBody(e.to_string()))?;

    if let Some(err) = resp.error {
        return Err(err.into_failure());
    }

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(TranslationFailure::NoChoices)?;

    if let Some(err) = choice.error {
        return Err(err.into_failure());
    }

    let content = choice
        .message
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(TranslationFailure::EmptyContent);
    }

    Ok(content)
}

fn extract_error_message(body_text: &str) -> String {
    // { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body_text.trim();
    if trimmed.chars().count() > 400 {
        let snippet: String = trimmed.chars().take(400).collect();
        format!("{snippet}...")
    } else {
        trimmed.to_string()
    }
}

/// Bracketed placeholders (`[PLAYER]`, `{0}`) in order of first appearance.
pub fn placeholder_tokens(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for m in TOKEN_RE.find_iter(text) {
        if !tokens.contains(&m.as_str()) {
            tokens.push(m.as_str());
        }
    }
    tokens
}

pub fn build_prompt(text: &str, target_lang: &str, hint: Option<&str>) -> String {
    let mut p = String::new();

    p.push_str(&format!(
        "Translate the following text into {}. Keep every token enclosed in brackets exactly as it is, do not translate it. Reply with the translation only.\n",
        target_lang.trim()
    ));

    let tokens = placeholder_tokens(text);
    if !tokens.is_empty() {
        p.push_str(&format!("Tokens to keep unchanged: {}\n", tokens.join(", ")));
    }

    if let Some(hint) = hint {
        let hint = hint.trim();
        if !hint.is_empty() {
            p.push_str(&format!("Additional instructions: {hint}\n"));
        }
    }

    p.push_str("Text:\n");
    p.push_str(text);

    p
}
