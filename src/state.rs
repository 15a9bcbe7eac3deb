//! Render state and its pure transitions
//!
//! Every transition takes the current [`AppState`] by reference and returns the
//! next value; nothing here performs I/O. The [`crate::controller::Controller`]
//! sequences these around the network calls.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::brief::{Brief, BriefError, BriefField, FieldValue};
use crate::sessions::{CHAT_FALLBACK_REPLY, ChatTurn, SessionId, Transcript};

/// Shown when the analysis call fails for any reason
pub const ANALYSIS_ERROR_MESSAGE: &str = "Der skete en fejl under analysen. Prøv venligst igen.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub brief: Brief,
    pub analysis: Option<AnalysisResult>,
    pub transcript: Transcript,
    pub chat_input: String,
    pub analysis_in_flight: bool,
    pub chat_in_flight: bool,
    pub error: Option<String>,
    pub session_id: Option<SessionId>,
    /// Bumped by one on every transition
    pub revision: u64,
}

/// Outcome of asking to start an analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginAnalysis {
    /// Another analysis is in flight; state unchanged
    Ignored,
    /// The form failed validation; only the error message changed
    Rejected(AppState),
    /// Request should be issued for this brief snapshot
    Started(AppState, Brief),
}

impl AppState {
    fn next(&self) -> Self {
        let mut next = self.clone();
        next.revision = self.revision.wrapping_add(1);
        next
    }

    pub fn update_brief_field(
        &self,
        field: BriefField,
        value: FieldValue,
    ) -> Result<Self, BriefError> {
        let mut next = self.next();
        next.brief.set_field(field, value)?;
        Ok(next)
    }

    pub fn update_chat_input(&self, text: impl Into<String>) -> Self {
        let mut next = self.next();
        next.chat_input = text.into();
        next
    }

    /// Transcript is cleared here, before the outcome is known.
    pub fn begin_analysis(&self) -> BeginAnalysis {
        if self.analysis_in_flight {
            return BeginAnalysis::Ignored;
        }
        if let Err(err) = self.brief.validate() {
            let mut next = self.next();
            next.error = Some(validation_message(&err));
            return BeginAnalysis::Rejected(next);
        }
        let mut next = self.next();
        next.analysis_in_flight = true;
        next.error = None;
        next.transcript.clear();
        let brief = next.brief.clone();
        BeginAnalysis::Started(next, brief)
    }

    /// Turns recorded while the call was pending belong to the old session,
    /// so the transcript starts empty again.
    pub fn analysis_succeeded(&self, result: AnalysisResult, session_id: Option<SessionId>) -> Self {
        let mut next = self.next();
        next.analysis = Some(result);
        next.transcript.clear();
        next.session_id = session_id;
        next.analysis_in_flight = false;
        next
    }

    /// Previous result and session stay visible
    pub fn analysis_failed(&self) -> Self {
        let mut next = self.next();
        next.error = Some(ANALYSIS_ERROR_MESSAGE.to_string());
        next.analysis_in_flight = false;
        next
    }

    /// Returns the trimmed message to send, or `None` when the input is blank
    /// or a reply is still pending.
    pub fn begin_chat(&self, input: &str) -> Option<(Self, String)> {
        let text = input.trim();
        if text.is_empty() || self.chat_in_flight {
            return None;
        }
        let mut next = self.next();
        next.transcript.push(ChatTurn::user(text));
        next.chat_input.clear();
        next.chat_in_flight = true;
        Some((next, text.to_string()))
    }

    pub fn session_attached(&self, session_id: SessionId) -> Self {
        let mut next = self.next();
        next.session_id = Some(session_id);
        next
    }

    pub fn chat_replied(&self, reply: impl Into<String>) -> Self {
        let mut next = self.next();
        next.transcript.push(ChatTurn::assistant(reply));
        next.chat_in_flight = false;
        next
    }

    pub fn chat_failed(&self) -> Self {
        self.chat_replied(CHAT_FALLBACK_REPLY)
    }

    /// The transcript the reply belonged to was cleared by a newer submission
    pub fn chat_abandoned(&self) -> Self {
        let mut next = self.next();
        next.chat_in_flight = false;
        next
    }
}

fn validation_message(err: &BriefError) -> String {
    match err {
        BriefError::MissingField(field) => {
            format!("Udfyld venligst alle felter: {}", field.as_str())
        }
        other => other.to_string(),
    }
}
