#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use email_mentor::analysis::{AnalysisResult, Feedback, OptimizedDraft, StrategicAdvice};
use email_mentor::brief::{BriefField, FieldValue};
use email_mentor::clients::{GenerateRequest, LanguageModel, ModelError};
use email_mentor::controller::Controller;
use tokio::sync::oneshot;

/// Replays queued replies in order and records every request it receives
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_err(&self, err: ModelError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyResponse))
    }
}

type Reply = Result<String, ModelError>;

/// Holds every call open until the test answers it by index, so replies can
/// land in any order
#[derive(Default)]
pub struct PendingModel {
    calls: Mutex<Vec<(GenerateRequest, Option<oneshot::Sender<Reply>>)>>,
}

impl PendingModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> GenerateRequest {
        self.calls.lock().unwrap()[index].0.clone()
    }

    /// Yield until at least `n` calls have reached the model
    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    pub fn respond(&self, index: usize, reply: Reply) {
        let tx = self.calls.lock().unwrap()[index]
            .1
            .take()
            .expect("call already answered");
        let _ = tx.send(reply);
    }
}

#[async_trait]
impl LanguageModel for PendingModel {
    fn model_id(&self) -> &str {
        "pending"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push((request, Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(ModelError::Transport("reply dropped".into())))
    }
}

pub fn sample_result() -> AnalysisResult {
    AnalysisResult {
        strategic_advice: StrategicAdvice {
            permission_check: "Trænere kan kontaktes som led i medlemsservice.".into(),
            segmentation_suggestions: vec!["Idrætsgren".into(), "Landsdel".into()],
        },
        feedback: Feedback {
            good: vec!["Konkret dato".into()],
            improvements: vec!["Flyt CTA op".into()],
            checklist: vec!["Afsendernavn".into(), "Mobilvisning".into()],
        },
        optimized_draft: OptimizedDraft {
            subject_lines: vec![
                "Bliv en stærkere træner".into(),
                "Kurset du har ventet på".into(),
                "Sidste chance for tilmelding".into(),
            ],
            preheader: "Tilmeld dig inden fredag".into(),
            content: "Hej træner,\n\nVi har et nyt kursus til dig.".into(),
        },
    }
}

pub fn sample_json() -> String {
    serde_json::to_string(&sample_result()).unwrap()
}

/// Fill every form field with the trainer-course scenario
pub async fn fill_brief(controller: &Controller) {
    let fields = [
        (BriefField::TargetGroup, "Trænere"),
        (BriefField::Purpose, "Tilmelding til kursus"),
        (BriefField::Value, "Bliv bedre til at motivere holdet"),
        (BriefField::Draft, "Hej træner, vi har et nyt kursus."),
    ];
    for (field, value) in fields {
        controller
            .update_brief_field(field, FieldValue::Text(value.into()))
            .await
            .unwrap();
    }
    controller
        .update_brief_field(BriefField::IsReadyForAction, FieldValue::Flag(true))
        .await
        .unwrap();
}
