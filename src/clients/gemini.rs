//! Gemini `generateContent` REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::traits::{GenerateRequest, LanguageModel, ModelError, ResponseFormat};
use crate::config::Config;
use crate::sessions::{ChatRole, ChatTurn};

const ERROR_SNIPPET_BYTES: usize = 500;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    model: String,
    api_base: String,
    api_key: Option<String>,
    timeout_ms: u64,
    client: Client,
}

impl GeminiClient {
    pub fn new(
        model: impl Into<String>,
        api_base: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ModelError::Transport(format!("build http client: {}", e)))?;
        Ok(Self {
            model: model.into(),
            api_base: api_base.into(),
            api_key: None,
            timeout_ms,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        let mut client = Self::new(
            config.model.model.clone(),
            config.model.api_base.clone(),
            config.model.timeout_ms,
        )?;
        client.api_key = config.runtime.api_key.clone();
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn map_send_err(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError> {
        let body = WireRequest::from(&request);
        tracing::debug!(
            model = %self.model,
            turns = request.contents.len(),
            format = ?request.response_format,
            "gemini generateContent"
        );

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(ref key) = self.api_key {
            builder = builder.header("x-goog-api-key", key);
        }

        let resp = builder.send().await.map_err(|e| self.map_send_err(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.map_send_err(e))?;

        if !status.is_success() {
            return Err(ModelError::Provider {
                status: status.as_u16(),
                message: provider_message(&text),
            });
        }

        let envelope: WireResponse = serde_json::from_str(&text).map_err(|e| {
            ModelError::Decode(format!(
                "{}: {}",
                e,
                truncate_snippet(&text, ERROR_SNIPPET_BYTES)
            ))
        })?;
        envelope.into_text()
    }
}

// Wire types follow the v1beta REST shape (camelCase, role "model" for the assistant)

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

impl WireContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![WirePart {
                text: Some(text.to_string()),
            }],
        }
    }
}

impl From<&ChatTurn> for WireContent {
    fn from(turn: &ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        };
        WireContent::text(Some(role), &turn.text)
    }
}

impl From<&GenerateRequest> for WireRequest {
    fn from(req: &GenerateRequest) -> Self {
        let response_mime_type = match req.response_format {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Text => "text/plain",
        };
        Self {
            contents: req.contents.iter().map(WireContent::from).collect(),
            system_instruction: req
                .system_instruction
                .as_deref()
                .map(|s| WireContent::text(None, s)),
            generation_config: WireGenerationConfig {
                response_mime_type,
                response_schema: req.response_schema.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl WireResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Result<String, ModelError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ModelError::Blocked { reason });
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyResponse)?;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            if let Some(reason) = candidate.finish_reason
                && reason != "STOP"
            {
                return Err(ModelError::Blocked { reason });
            }
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Pull `error.message` out of a Google API error body, else a raw snippet
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| truncate_snippet(body.trim(), ERROR_SNIPPET_BYTES))
}

fn truncate_snippet(input: &str, max: usize) -> String {
    if input.len() <= max {
        return input.to_string();
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &input[..end])
}
