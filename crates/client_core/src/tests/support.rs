//! Fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex as StdMutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use shared::{
    domain::ActionParams,
    error::ServiceError,
    protocol::{ExecuteResponse, ExecutionLogEntry, PlannerResponse, ResponseKind},
};
use tokio::sync::{oneshot, Notify};

use crate::{
    speech::{CaptureCallback, SpeechCapture, SpeechPlayback, Utterance},
    ExecutorService, LogService, PlannerService,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Cancel,
    Speak(String),
}

#[derive(Default)]
pub struct RecordingPlayback {
    pub events: StdMutex<Vec<PlaybackEvent>>,
    pub audible: StdMutex<Option<Utterance>>,
    pub unavailable: bool,
}

impl RecordingPlayback {
    pub fn spoken(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("events")
            .iter()
            .filter_map(|event| match event {
                PlaybackEvent::Speak(text) => Some(text.clone()),
                PlaybackEvent::Cancel => None,
            })
            .collect()
    }

    pub fn audible_text(&self) -> Option<String> {
        self.audible
            .lock()
            .expect("audible")
            .as_ref()
            .map(|utterance| utterance.text.clone())
    }
}

impl SpeechPlayback for RecordingPlayback {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        self.events
            .lock()
            .expect("events")
            .push(PlaybackEvent::Speak(utterance.text.clone()));
        *self.audible.lock().expect("audible") = Some(utterance);
        Ok(())
    }

    fn cancel(&self) {
        self.events.lock().expect("events").push(PlaybackEvent::Cancel);
        *self.audible.lock().expect("audible") = None;
    }
}

/// Answers each activation with the next scripted transcription, if any.
#[derive(Default)]
pub struct ScriptedCapture {
    pub transcripts: StdMutex<VecDeque<String>>,
    pub fail_start: bool,
    pub started_langs: StdMutex<Vec<String>>,
    pub stops: StdMutex<u32>,
}

impl ScriptedCapture {
    pub fn with(transcripts: &[&str]) -> Self {
        Self {
            transcripts: StdMutex::new(transcripts.iter().map(|t| t.to_string()).collect()),
            ..Self::default()
        }
    }
}

impl SpeechCapture for ScriptedCapture {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&self, lang: &str, on_result: CaptureCallback) -> Result<()> {
        if self.fail_start {
            return Err(anyhow!("microphone permission denied"));
        }
        self.started_langs
            .lock()
            .expect("langs")
            .push(lang.to_string());
        if let Some(text) = self.transcripts.lock().expect("transcripts").pop_front() {
            on_result(text);
        }
        Ok(())
    }

    fn stop(&self) {
        *self.stops.lock().expect("stops") += 1;
    }
}

pub fn params(value: serde_json::Value) -> ActionParams {
    value.as_object().cloned().unwrap_or_default()
}

pub fn planner_reply(kind: ResponseKind, text: &str) -> PlannerResponse {
    PlannerResponse {
        response_type: kind,
        response: Some(text.to_string()),
        ..PlannerResponse::default()
    }
}

pub fn planner_approval(message: &str, action: &str) -> PlannerResponse {
    PlannerResponse {
        response_type: ResponseKind::Approval,
        message: Some(message.to_string()),
        action: Some(action.to_string()),
        params: Some(params(json!({ "to": ["x@example.com"], "subject": "Hi" }))),
        ..PlannerResponse::default()
    }
}

/// Planner fake. When `hold` is set, the first call reports itself through
/// `called` and waits for `release` before answering; later calls answer at once.
#[derive(Default)]
pub struct FakePlanner {
    pub responses: StdMutex<VecDeque<Result<PlannerResponse, ServiceError>>>,
    pub prompts: StdMutex<Vec<String>>,
    pub hold: Option<Arc<Notify>>,
    pub called: StdMutex<Option<oneshot::Sender<()>>>,
}

impl FakePlanner {
    pub fn answering(responses: Vec<Result<PlannerResponse, ServiceError>>) -> Self {
        Self {
            responses: StdMutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn held(
        response: Result<PlannerResponse, ServiceError>,
    ) -> (Self, Arc<Notify>, oneshot::Receiver<()>) {
        let release = Arc::new(Notify::new());
        let (called_tx, called_rx) = oneshot::channel();
        let planner = Self {
            responses: StdMutex::new(VecDeque::from(vec![response])),
            prompts: StdMutex::new(Vec::new()),
            hold: Some(release.clone()),
            called: StdMutex::new(Some(called_tx)),
        };
        (planner, release, called_rx)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts").clone()
    }
}

#[async_trait]
impl PlannerService for FakePlanner {
    async fn plan(&self, prompt: &str) -> Result<PlannerResponse, ServiceError> {
        self.prompts
            .lock()
            .expect("prompts")
            .push(prompt.to_string());
        let first_held_call = self.called.lock().expect("called").take();
        if let (Some(release), Some(called)) = (&self.hold, first_held_call) {
            let _ = called.send(());
            release.notified().await;
        }
        self.responses
            .lock()
            .expect("responses")
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::transport("no scripted planner response")))
    }
}

#[derive(Default)]
pub struct FakeExecutor {
    pub responses: StdMutex<VecDeque<Result<ExecuteResponse, ServiceError>>>,
    pub calls: StdMutex<Vec<(String, ActionParams)>>,
    pub hold: Option<Arc<Notify>>,
    pub called: StdMutex<Option<oneshot::Sender<()>>>,
}

impl FakeExecutor {
    pub fn answering(responses: Vec<Result<ExecuteResponse, ServiceError>>) -> Self {
        Self {
            responses: StdMutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn held(
        response: Result<ExecuteResponse, ServiceError>,
    ) -> (Self, Arc<Notify>, oneshot::Receiver<()>) {
        let release = Arc::new(Notify::new());
        let (called_tx, called_rx) = oneshot::channel();
        let executor = Self {
            responses: StdMutex::new(VecDeque::from(vec![response])),
            calls: StdMutex::new(Vec::new()),
            hold: Some(release.clone()),
            called: StdMutex::new(Some(called_tx)),
        };
        (executor, release, called_rx)
    }

    pub fn calls(&self) -> Vec<(String, ActionParams)> {
        self.calls.lock().expect("calls").clone()
    }
}

#[async_trait]
impl ExecutorService for FakeExecutor {
    async fn execute(
        &self,
        action: &str,
        params: &ActionParams,
    ) -> Result<ExecuteResponse, ServiceError> {
        self.calls
            .lock()
            .expect("calls")
            .push((action.to_string(), params.clone()));
        let first_held_call = self.called.lock().expect("called").take();
        if let (Some(release), Some(called)) = (&self.hold, first_held_call) {
            let _ = called.send(());
            release.notified().await;
        }
        self.responses
            .lock()
            .expect("responses")
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::transport("no scripted executor response")))
    }
}

#[derive(Default)]
pub struct FakeLogs {
    pub responses: StdMutex<VecDeque<Result<Vec<ExecutionLogEntry>, ServiceError>>>,
}

impl FakeLogs {
    pub fn answering(responses: Vec<Result<Vec<ExecutionLogEntry>, ServiceError>>) -> Self {
        Self {
            responses: StdMutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LogService for FakeLogs {
    async fn fetch_logs(&self) -> Result<Vec<ExecutionLogEntry>, ServiceError> {
        self.responses
            .lock()
            .expect("responses")
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::transport("no scripted log response")))
    }
}
