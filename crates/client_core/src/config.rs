use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

use crate::speech::VoiceSettings;

pub const DEFAULT_SETTINGS_FILE: &str = "agent.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub session_token: Option<String>,
    pub tts_enabled: bool,
    pub voice: VoiceSettings,
    /// Unset leaves reqwest's defaults in place.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5050".into(),
            session_token: None,
            tts_enabled: true,
            voice: VoiceSettings::default(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    session_token: Option<String>,
    tts_enabled: Option<bool>,
    request_timeout_secs: Option<u64>,
    voice: Option<VoiceSettings>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let path = Path::new(DEFAULT_SETTINGS_FILE);
    if path.exists() {
        apply_file(&mut settings, path)?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.server_url = validate_server_url(&settings.server_url)?;
    Ok(settings)
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    apply_file(&mut settings, path)?;
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.server_url = validate_server_url(&settings.server_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.session_token {
        settings.session_token = Some(v);
    }
    if let Some(v) = file_cfg.tts_enabled {
        settings.tts_enabled = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.voice {
        settings.voice = v;
    }
    Ok(())
}

/// Environment overrides; later keys win. Unparseable values are ignored.
pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("AGENT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("AGENT_SESSION_TOKEN") {
        settings.session_token = Some(v);
    }
    if let Some(v) = lookup("APP__SESSION_TOKEN") {
        settings.session_token = Some(v);
    }

    if let Some(v) = lookup("APP__TTS_ENABLED") {
        if let Ok(parsed) = v.trim().parse::<bool>() {
            settings.tts_enabled = parsed;
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = lookup("APP__VOICE_LANG") {
        if !v.trim().is_empty() {
            settings.voice.lang = v.trim().to_string();
        }
    }
}

/// Trims, drops trailing slashes and checks for an http(s) base url.
pub fn validate_server_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(Settings::default().server_url);
    }

    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid server url '{trimmed}'"))?;
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        bail!("server url '{trimmed}' must use http or https");
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
