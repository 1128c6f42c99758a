//! Bridge between the session and the injected speech devices.
//!
//! Both devices are fire-and-forget: the bridge never waits for playback to
//! finish and capture results arrive through a one-shot callback. At most one
//! utterance is audible at a time; a new `speak` always cancels the previous one.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Receives the transcription of one capture activation.
///
/// A device that ends an activation without a result drops the callback.
pub type CaptureCallback = Box<dyn FnOnce(String) + Send + 'static>;

pub trait SpeechCapture: Send + Sync {
    fn is_available(&self) -> bool;
    fn start(&self, lang: &str, on_result: CaptureCallback) -> Result<()>;
    fn stop(&self);
}

pub trait SpeechPlayback: Send + Sync {
    fn is_available(&self) -> bool;
    fn speak(&self, utterance: Utterance) -> Result<()>;
    fn cancel(&self);
}

pub struct MissingSpeechCapture;

impl SpeechCapture for MissingSpeechCapture {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _lang: &str, _on_result: CaptureCallback) -> Result<()> {
        Err(anyhow!("speech capture device is unavailable"))
    }

    fn stop(&self) {}
}

pub struct MissingSpeechPlayback;

impl SpeechPlayback for MissingSpeechPlayback {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _utterance: Utterance) -> Result<()> {
        Err(anyhow!("speech playback device is unavailable"))
    }

    fn cancel(&self) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            lang: "en-US".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

/// Session-wide audio toggle, read on every `speak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAudioState {
    pub tts_enabled: bool,
}

impl Default for SessionAudioState {
    fn default() -> Self {
        Self { tts_enabled: true }
    }
}

pub struct SpeechBridge {
    capture: Arc<dyn SpeechCapture>,
    playback: Arc<dyn SpeechPlayback>,
    voice: VoiceSettings,
}

impl SpeechBridge {
    pub fn new(
        capture: Arc<dyn SpeechCapture>,
        playback: Arc<dyn SpeechPlayback>,
        voice: VoiceSettings,
    ) -> Self {
        Self {
            capture,
            playback,
            voice,
        }
    }

    pub fn silent() -> Self {
        Self::new(
            Arc::new(MissingSpeechCapture),
            Arc::new(MissingSpeechPlayback),
            VoiceSettings::default(),
        )
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    /// Replaces whatever is playing with `text`. Returns whether playback was issued.
    pub fn speak(&self, audio: SessionAudioState, text: &str) -> bool {
        let text = text.trim();
        if !audio.tts_enabled || text.is_empty() || !self.playback.is_available() {
            return false;
        }

        self.playback.cancel();
        let utterance = Utterance {
            text: text.to_string(),
            rate: self.voice.rate,
            pitch: self.voice.pitch,
            volume: self.voice.volume,
            lang: self.voice.lang.clone(),
        };
        match self.playback.speak(utterance) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "speech playback failed");
                false
            }
        }
    }

    pub fn cancel_playback(&self) {
        if self.playback.is_available() {
            self.playback.cancel();
        }
    }

    /// Starts one capture activation. Blank transcriptions are dropped.
    pub fn capture(&self, on_result: CaptureCallback) -> bool {
        if !self.capture.is_available() {
            debug!("speech capture requested without a capture device");
            return false;
        }

        let deliver: CaptureCallback = Box::new(move |text: String| {
            let text = text.trim();
            if !text.is_empty() {
                on_result(text.to_string());
            }
        });
        match self.capture.start(&self.voice.lang, deliver) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "speech capture failed to start");
                false
            }
        }
    }

    /// Captures one utterance, or `None` if the device produced nothing.
    pub async fn capture_once(&self) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        let started = self.capture(Box::new(move |text: String| {
            let _ = tx.send(text);
        }));
        if !started {
            return None;
        }
        rx.await.ok()
    }

    pub fn stop_capture(&self) {
        if self.capture.is_available() {
            self.capture.stop();
        }
    }
}

#[cfg(test)]
#[path = "tests/speech_tests.rs"]
mod tests;
