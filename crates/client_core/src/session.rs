use std::sync::Arc;

use shared::domain::{ActionParams, ApprovalRequest, EntryId, TranscriptEntry};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    approval::{ApprovalGate, REJECTED_MESSAGE},
    dispatcher::PlannerDecision,
    execution::{ExecutionResolution, ExecutionTracker},
    history::HistoryViewer,
    quick_actions,
    speech::{SessionAudioState, SpeechBridge},
    transcript::TranscriptStore,
    transport::AgentHttpClient,
    ExecutorService, LogService, PlannerService,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightKind {
    Dispatch,
    Execution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flight {
    #[default]
    Idle,
    Busy(FlightKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    EntryAppended(TranscriptEntry),
    EntryResolved(TranscriptEntry),
    ApprovalOpened(ApprovalRequest),
    ApprovalClosed,
    TtsToggled(bool),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Another dispatch or execution is in flight.
    Busy,
    /// An approval must be resolved first.
    AwaitingApproval,
    Replied(EntryId),
    ApprovalRequested,
    Failed(EntryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    NoRequest,
    Busy,
    Executed { entry_id: EntryId, succeeded: bool },
    Rejected(EntryId),
}

struct SessionState {
    transcript: TranscriptStore,
    gate: ApprovalGate,
    flight: Flight,
    audio: SessionAudioState,
}

/// Transcript, gate and flight change only under `inner`; planner, executor and
/// speech calls run with the lock released.
pub struct AgentSession {
    id: Uuid,
    planner: Arc<dyn PlannerService>,
    executor: Arc<dyn ExecutorService>,
    logs: Arc<dyn LogService>,
    speech: SpeechBridge,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl AgentSession {
    pub fn new(
        planner: Arc<dyn PlannerService>,
        executor: Arc<dyn ExecutorService>,
        logs: Arc<dyn LogService>,
        speech: SpeechBridge,
        audio: SessionAudioState,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            id: Uuid::new_v4(),
            planner,
            executor,
            logs,
            speech,
            inner: Mutex::new(SessionState {
                transcript: TranscriptStore::new(),
                gate: ApprovalGate::new(),
                flight: Flight::Idle,
                audio,
            }),
            events,
        })
    }

    pub fn from_http(
        client: Arc<AgentHttpClient>,
        speech: SpeechBridge,
        audio: SessionAudioState,
    ) -> Arc<Self> {
        Self::new(client.clone(), client.clone(), client, speech, audio)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.inner.lock().await.transcript.entries().to_vec()
    }

    pub async fn pending_approval(&self) -> Option<ApprovalRequest> {
        self.inner.lock().await.gate.current().cloned()
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.lock().await.flight != Flight::Idle
    }

    pub async fn audio_state(&self) -> SessionAudioState {
        self.inner.lock().await.audio
    }

    /// Sends one utterance to the planner and applies its decision.
    pub async fn dispatch(&self, utterance: &str) -> DispatchOutcome {
        let prompt = utterance.trim();
        if prompt.is_empty() {
            return DispatchOutcome::Ignored;
        }

        {
            let mut guard = self.inner.lock().await;
            if guard.flight != Flight::Idle {
                debug!(session_id = %self.id, flight = ?guard.flight, "dispatch refused: session busy");
                return DispatchOutcome::Busy;
            }
            if guard.gate.is_open() {
                debug!(session_id = %self.id, "dispatch refused: approval outstanding");
                return DispatchOutcome::AwaitingApproval;
            }
            let entry_id = guard.transcript.push_user(prompt);
            guard.flight = Flight::Busy(FlightKind::Dispatch);
            self.emit_appended(&guard.transcript, entry_id);
        }

        info!(session_id = %self.id, "dispatching utterance to planner");
        let result = self.planner.plan(prompt).await;
        match &result {
            Ok(response) => {
                info!(session_id = %self.id, response_type = ?response.response_type, "planner responded")
            }
            Err(err) => warn!(session_id = %self.id, error = %err, "planner call failed"),
        }
        let decision = PlannerDecision::from_result(result);

        let (outcome, audio) = {
            let mut guard = self.inner.lock().await;
            guard.flight = Flight::Idle;
            let outcome = match &decision {
                PlannerDecision::Reply(text) => {
                    let entry_id = guard.transcript.push_agent(text.clone());
                    self.emit_appended(&guard.transcript, entry_id);
                    DispatchOutcome::Replied(entry_id)
                }
                PlannerDecision::Failure(text) => {
                    let entry_id = guard.transcript.push_agent(text.clone());
                    self.emit_appended(&guard.transcript, entry_id);
                    DispatchOutcome::Failed(entry_id)
                }
                PlannerDecision::AwaitApproval(request) => {
                    if let Err(violation) = guard.gate.open(request.clone()) {
                        error!(session_id = %self.id, %violation, "dispatch reached an open gate");
                        debug_assert!(false, "{violation}");
                        return DispatchOutcome::AwaitingApproval;
                    }
                    info!(session_id = %self.id, action = %request.action, kind = ?request.kind, "approval requested");
                    let _ = self
                        .events
                        .send(SessionEvent::ApprovalOpened(request.clone()));
                    DispatchOutcome::ApprovalRequested
                }
            };
            (outcome, guard.audio)
        };

        self.speech.speak(audio, decision.spoken_text());
        outcome
    }

    /// Dispatches the example prompt of a quick action, if the label is known.
    pub async fn dispatch_quick_action(&self, label: &str) -> Option<DispatchOutcome> {
        let action = quick_actions::find(label)?;
        Some(self.dispatch(action.example).await)
    }

    pub async fn approve(&self) -> ApprovalOutcome {
        self.execute_approved(None).await
    }

    /// Approves with parameters edited in a preview form.
    pub async fn approve_with_params(&self, params: ActionParams) -> ApprovalOutcome {
        self.execute_approved(Some(params)).await
    }

    pub async fn reject(&self) -> ApprovalOutcome {
        let (entry_id, audio) = {
            let mut guard = self.inner.lock().await;
            let Some(request) = guard.gate.reject() else {
                return ApprovalOutcome::NoRequest;
            };
            info!(session_id = %self.id, action = %request.action, "approval rejected");
            let _ = self.events.send(SessionEvent::ApprovalClosed);
            let entry_id = guard.transcript.push_agent(REJECTED_MESSAGE);
            self.emit_appended(&guard.transcript, entry_id);
            (entry_id, guard.audio)
        };

        self.speech.speak(audio, REJECTED_MESSAGE);
        ApprovalOutcome::Rejected(entry_id)
    }

    async fn execute_approved(&self, edited: Option<ActionParams>) -> ApprovalOutcome {
        let (request, pending) = {
            let mut guard = self.inner.lock().await;
            if !guard.gate.is_open() {
                return ApprovalOutcome::NoRequest;
            }
            if guard.flight != Flight::Idle {
                return ApprovalOutcome::Busy;
            }
            let approved = match edited {
                Some(params) => guard.gate.approve_with_params(params),
                None => guard.gate.approve(),
            };
            let Some(request) = approved else {
                return ApprovalOutcome::NoRequest;
            };
            let _ = self.events.send(SessionEvent::ApprovalClosed);

            let pending = match ExecutionTracker::begin(&mut guard.transcript, &request.action) {
                Ok(pending) => pending,
                Err(violation) => {
                    error!(session_id = %self.id, %violation, "execution started with a pending entry");
                    debug_assert!(false, "{violation}");
                    return ApprovalOutcome::Busy;
                }
            };
            guard.flight = Flight::Busy(FlightKind::Execution);
            self.emit_appended(&guard.transcript, pending.entry_id);
            (request, pending)
        };

        info!(session_id = %self.id, action = %request.action, entry_id = pending.entry_id.0, "executing approved action");
        let result = self.executor.execute(&request.action, &request.params).await;
        let resolution = ExecutionResolution::from_result(&request.action, result);
        let succeeded = resolution.succeeded;

        let (text, audio) = {
            let mut guard = self.inner.lock().await;
            guard.flight = Flight::Idle;
            match ExecutionTracker::finish(&mut guard.transcript, &pending, resolution) {
                Ok(entry) => {
                    let text = entry.text.clone();
                    let _ = self.events.send(SessionEvent::EntryResolved(entry));
                    (text, guard.audio)
                }
                Err(violation) => {
                    error!(session_id = %self.id, %violation, "pending entry vanished during execution");
                    return ApprovalOutcome::Executed {
                        entry_id: pending.entry_id,
                        succeeded,
                    };
                }
            }
        };

        info!(session_id = %self.id, action = %request.action, succeeded, "execution resolved");
        self.speech.speak(audio, &text);
        ApprovalOutcome::Executed {
            entry_id: pending.entry_id,
            succeeded,
        }
    }

    pub async fn set_tts_enabled(&self, enabled: bool) {
        self.update_tts(|_| enabled).await;
    }

    pub async fn toggle_tts(&self) -> bool {
        self.update_tts(|enabled| !enabled).await
    }

    async fn update_tts(&self, next: impl FnOnce(bool) -> bool) -> bool {
        let enabled = {
            let mut guard = self.inner.lock().await;
            let enabled = next(guard.audio.tts_enabled);
            if guard.audio.tts_enabled == enabled {
                return enabled;
            }
            guard.audio.tts_enabled = enabled;
            enabled
        };
        if !enabled {
            self.speech.cancel_playback();
        }
        info!(session_id = %self.id, enabled, "text-to-speech toggled");
        let _ = self.events.send(SessionEvent::TtsToggled(enabled));
        enabled
    }

    /// Clears transcript and gate. Refused while a call is in flight.
    pub async fn reset(&self) -> bool {
        {
            let mut guard = self.inner.lock().await;
            if guard.flight != Flight::Idle {
                return false;
            }
            guard.transcript.clear();
            if guard.gate.reject().is_some() {
                let _ = self.events.send(SessionEvent::ApprovalClosed);
            }
        }
        self.speech.cancel_playback();
        let _ = self.events.send(SessionEvent::Reset);
        true
    }

    pub fn history(&self) -> HistoryViewer {
        HistoryViewer::new(self.logs.clone())
    }

    pub fn speech(&self) -> &SpeechBridge {
        &self.speech
    }

    /// Captures one spoken utterance; the caller decides whether to dispatch it.
    pub async fn capture_utterance(&self) -> Option<String> {
        self.speech.capture_once().await
    }

    fn emit_appended(&self, transcript: &TranscriptStore, entry_id: EntryId) {
        if let Some(entry) = transcript.get(entry_id) {
            let _ = self.events.send(SessionEvent::EntryAppended(entry.clone()));
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
