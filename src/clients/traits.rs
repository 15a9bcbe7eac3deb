use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::sessions::ChatTurn;

/// Shape the model is asked to answer in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// One call to the remote model: a conversation plus generation config
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub contents: Vec<ChatTurn>,
    pub system_instruction: Option<String>,
    pub response_format: ResponseFormat,
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    /// Single user turn, no history
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            contents: vec![ChatTurn::user(text)],
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.response_format = ResponseFormat::Json;
        self.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("prompt blocked by provider: {reason}")]
    Blocked { reason: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("could not decode provider envelope: {0}")]
    Decode(String),
}

/// Provider-agnostic boundary to a hosted language model.
///
/// Implementations issue exactly one outbound request per call and never retry.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, used for logging
    fn model_id(&self) -> &str;

    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError>;
}
