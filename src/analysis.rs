//! One-shot analysis call: brief in, validated structured advice out

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::brief::{Brief, BriefError};
use crate::clients::traits::{GenerateRequest, LanguageModel, ModelError};
use crate::prompts::{MENTOR_SYSTEM_INSTRUCTION, build_analysis_prompt};
use crate::schemas::{analysis_response_schema, validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub strategic_advice: StrategicAdvice,
    pub feedback: Feedback,
    pub optimized_draft: OptimizedDraft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicAdvice {
    pub permission_check: String,
    pub segmentation_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub good: Vec<String>,
    pub improvements: Vec<String>,
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedDraft {
    pub subject_lines: Vec<String>,
    pub preheader: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid brief: {0}")]
    InvalidBrief(#[from] BriefError),
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("provider error: {0}")]
    ProviderError(String),
}

impl From<ModelError> for AnalysisError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Transport(_) | ModelError::Timeout { .. } => {
                AnalysisError::NetworkFailure(err.to_string())
            }
            ModelError::Provider { .. } | ModelError::Blocked { .. } => {
                AnalysisError::ProviderError(err.to_string())
            }
            ModelError::EmptyResponse | ModelError::Decode(_) => {
                AnalysisError::InvalidResponse(err.to_string())
            }
        }
    }
}

impl AnalysisResult {
    /// Compact JSON used as chat context
    pub fn to_context_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse raw model text: strip code fences, check the schema, then type it.
    pub fn from_model_text(text: &str) -> Result<Self, AnalysisError> {
        let trimmed = strip_code_fences(text);
        if trimmed.is_empty() {
            return Err(AnalysisError::InvalidResponse("empty response".into()));
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| AnalysisError::InvalidResponse(format!("not JSON: {}", e)))?;
        validate(&value, &analysis_response_schema())
            .map_err(|v| AnalysisError::InvalidResponse(v.to_string()))?;
        let result: AnalysisResult = serde_json::from_value(value)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
        if result.optimized_draft.subject_lines.is_empty() {
            return Err(AnalysisError::InvalidResponse(
                "optimizedDraft.subjectLines: must not be empty".into(),
            ));
        }
        Ok(result)
    }
}

fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Issues exactly one model request per [`AnalysisClient::analyze`] call
#[derive(Clone)]
pub struct AnalysisClient {
    model: Arc<dyn LanguageModel>,
}

impl AnalysisClient {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn analyze(&self, brief: &Brief) -> Result<AnalysisResult, AnalysisError> {
        let prompt = build_analysis_prompt(brief)?;
        let request = GenerateRequest::prompt(prompt)
            .with_system_instruction(MENTOR_SYSTEM_INSTRUCTION)
            .with_json_schema(analysis_response_schema());

        tracing::info!(model = %self.model.model_id(), "requesting email analysis");
        let text = self.model.generate(request).await?;
        tracing::debug!(bytes = text.len(), "analysis response received");

        AnalysisResult::from_model_text(&text)
    }
}
