//! Multi-turn conversation with the mentor, seeded with an analysis result

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::clients::traits::{GenerateRequest, LanguageModel, ModelError};
use crate::prompts::chat_system_instruction;

/// Prefix of the synthetic assistant turn that carries the analysis context
pub const SEED_PREFIX: &str = "Her er min feedback på din email:\n\n";

/// Assistant turn recorded in place of a reply when a chat call fails
pub const CHAT_FALLBACK_REPLY: &str = "Beklager, jeg fik en fejl i min hjerne. Prøv at spørge igen!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered, append-only record of chat turns
pub type Transcript = Vec<ChatTurn>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat failed: {0}")]
    ChatFailure(#[from] ModelError),
}

/// Stateful dialogue handle.
///
/// The provider keeps no state between calls, so the session resends its
/// full history with every turn. History only grows on successful replies.
pub struct ChatSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    model: Arc<dyn LanguageModel>,
    system_instruction: String,
    history: Transcript,
}

impl ChatSession {
    /// Seed with `prior` verbatim, or with a synthetic assistant turn holding
    /// `context` when there is no prior transcript.
    pub fn create(model: Arc<dyn LanguageModel>, context: &str, prior: &[ChatTurn]) -> Self {
        let history = if prior.is_empty() {
            vec![ChatTurn::assistant(format!("{SEED_PREFIX}{context}"))]
        } else {
            prior.to_vec()
        };
        let session = Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            model,
            system_instruction: chat_system_instruction(),
            history,
        };
        tracing::debug!(
            session = %session.id,
            seeded_turns = session.history.len(),
            "chat session created"
        );
        session
    }

    /// Eager path after a successful analysis
    pub fn for_analysis(
        model: Arc<dyn LanguageModel>,
        result: &AnalysisResult,
    ) -> Result<Self, serde_json::Error> {
        let context = result.to_context_string()?;
        Ok(Self::create(model, &context, &[]))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Send one user turn and return the assistant's reply text
    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let mut contents = self.history.clone();
        contents.push(ChatTurn::user(text));
        let request = GenerateRequest {
            contents,
            ..Default::default()
        }
        .with_system_instruction(self.system_instruction.clone());

        let reply = self.model.generate(request).await?;

        self.history.push(ChatTurn::user(text));
        self.history.push(ChatTurn::assistant(reply.clone()));
        Ok(reply)
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("model", &self.model.model_id())
            .field("turns", &self.history.len())
            .finish()
    }
}
