//! Coordinator between the render state, the analysis call and the chat session
//!
//! The mutex is only held to check guards and swap in the next state; it is
//! never held across a model call. Each published state is an immutable
//! `Arc<AppState>` delivered through a `watch` channel.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::analysis::AnalysisClient;
use crate::brief::{BriefError, BriefField, FieldValue};
use crate::clients::traits::LanguageModel;
use crate::sessions::{ChatSession, Transcript};
use crate::state::{AppState, BeginAnalysis};

struct Inner {
    state: Arc<AppState>,
    session: Option<ChatSession>,
    /// Bumped whenever a submission starts or succeeds, since both clear the
    /// transcript
    transcript_epoch: u64,
}

pub struct Controller {
    model: Arc<dyn LanguageModel>,
    analysis: AnalysisClient,
    inner: Mutex<Inner>,
    tx: watch::Sender<Arc<AppState>>,
}

impl Controller {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::restore(model, AppState::default())
    }

    /// Start from an existing state value. No session is attached; the first
    /// chat message creates one from the restored transcript. In-flight flags
    /// are cleared since nothing is running yet.
    pub fn restore(model: Arc<dyn LanguageModel>, mut state: AppState) -> Self {
        state.analysis_in_flight = false;
        state.chat_in_flight = false;
        state.session_id = None;
        let state = Arc::new(state);
        let (tx, _rx) = watch::channel(state.clone());
        Self {
            analysis: AnalysisClient::new(model.clone()),
            model,
            inner: Mutex::new(Inner {
                state,
                session: None,
                transcript_epoch: 0,
            }),
            tx,
        }
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<AppState> {
        self.tx.borrow().clone()
    }

    /// Receive every state published from now on
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.tx.subscribe()
    }

    /// History of the attached session, if one exists and is not mid-call
    pub async fn session_history(&self) -> Option<Transcript> {
        let inner = self.inner.lock().await;
        inner.session.as_ref().map(|s| s.history().to_vec())
    }

    fn publish(&self, inner: &mut Inner, next: AppState) -> Arc<AppState> {
        let next = Arc::new(next);
        inner.state = next.clone();
        self.tx.send_replace(next.clone());
        next
    }

    pub async fn update_brief_field(
        &self,
        field: BriefField,
        value: FieldValue,
    ) -> Result<Arc<AppState>, BriefError> {
        let mut inner = self.inner.lock().await;
        let next = inner.state.update_brief_field(field, value)?;
        Ok(self.publish(&mut inner, next))
    }

    pub async fn update_chat_input(&self, text: impl Into<String>) -> Arc<AppState> {
        let mut inner = self.inner.lock().await;
        let next = inner.state.update_chat_input(text);
        self.publish(&mut inner, next)
    }

    /// Analyze the current form. Resolves once the call has settled.
    pub async fn submit_brief(&self) -> Arc<AppState> {
        let brief = {
            let mut inner = self.inner.lock().await;
            match inner.state.begin_analysis() {
                BeginAnalysis::Ignored => {
                    tracing::debug!("submit ignored: analysis already in flight");
                    return inner.state.clone();
                }
                BeginAnalysis::Rejected(next) => {
                    tracing::debug!("submit rejected: brief incomplete");
                    return self.publish(&mut inner, next);
                }
                BeginAnalysis::Started(next, brief) => {
                    inner.transcript_epoch = inner.transcript_epoch.wrapping_add(1);
                    self.publish(&mut inner, next);
                    brief
                }
            }
        };

        let outcome = self.analysis.analyze(&brief).await;

        let mut inner = self.inner.lock().await;
        match outcome {
            Ok(result) => {
                let session = match ChatSession::for_analysis(self.model.clone(), &result) {
                    Ok(session) => Some(session),
                    Err(e) => {
                        tracing::warn!("could not seed chat session, deferring to first message: {}", e);
                        None
                    }
                };
                let session_id = session.as_ref().map(ChatSession::id);
                if let Some(session) = &session {
                    tracing::info!(
                        session = %session.id(),
                        created_at = %session.created_at(),
                        "chat session seeded from analysis"
                    );
                }
                inner.session = session;
                // Chat calls still pending belong to the replaced session
                inner.transcript_epoch = inner.transcript_epoch.wrapping_add(1);
                let next = inner.state.analysis_succeeded(result, session_id);
                tracing::info!(session = ?session_id, "analysis complete");
                self.publish(&mut inner, next)
            }
            Err(err) => {
                tracing::warn!(error = %err, "analysis failed");
                let next = inner.state.analysis_failed();
                self.publish(&mut inner, next)
            }
        }
    }

    /// Send one chat message. Blank input and sends while a reply is pending
    /// are ignored. Resolves once the reply (or fallback) is recorded.
    pub async fn send_chat_message(&self, input: &str) -> Arc<AppState> {
        let (text, mut session, epoch) = {
            let mut inner = self.inner.lock().await;
            let Some((next, text)) = inner.state.begin_chat(input) else {
                return inner.state.clone();
            };
            self.publish(&mut inner, next);

            let session = match inner.session.take() {
                Some(session) => session,
                None => {
                    let session = self.create_lazy_session(&inner.state);
                    let next = inner.state.session_attached(session.id());
                    self.publish(&mut inner, next);
                    session
                }
            };
            (text, session, inner.transcript_epoch)
        };

        let outcome = session.send(&text).await;

        let mut inner = self.inner.lock().await;
        // A successful analysis may have installed a newer session meanwhile
        if inner.session.is_none() {
            inner.session = Some(session);
        }
        if inner.transcript_epoch != epoch {
            tracing::debug!("dropping chat reply for a cleared transcript");
            let next = inner.state.chat_abandoned();
            return self.publish(&mut inner, next);
        }
        let next = match outcome {
            Ok(reply) => inner.state.chat_replied(reply),
            Err(err) => {
                tracing::warn!(error = %err, "chat message failed");
                inner.state.chat_failed()
            }
        };
        self.publish(&mut inner, next)
    }

    /// Seed from the transcript recorded before the pending user turn, with
    /// the stored analysis (or nothing) as context.
    fn create_lazy_session(&self, state: &AppState) -> ChatSession {
        let prior = match state.transcript.split_last() {
            Some((_pending, prior)) => prior,
            None => &[],
        };
        let context = match &state.analysis {
            Some(result) => result.to_context_string().unwrap_or_else(|e| {
                tracing::warn!("could not serialize analysis for chat context: {}", e);
                String::new()
            }),
            None => String::new(),
        };
        let session = ChatSession::create(self.model.clone(), &context, prior);
        tracing::info!(
            session = %session.id(),
            created_at = %session.created_at(),
            prior_turns = prior.len(),
            "chat session created lazily"
        );
        session
    }
}
