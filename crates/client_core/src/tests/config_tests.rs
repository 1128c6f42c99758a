use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn temp_settings_file(label: &str, contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("vocal_agent_config_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("agent.toml");
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn defaults_enable_tts_without_timeout() {
    let settings = Settings::default();
    assert_eq!(settings.server_url, "http://127.0.0.1:5050");
    assert!(settings.tts_enabled);
    assert_eq!(settings.request_timeout(), None);
    assert_eq!(settings.voice, VoiceSettings::default());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        lookup_from(&[
            ("AGENT_SERVER_URL", "http://plain.example.com"),
            ("APP__SERVER_URL", "https://app.example.com"),
            ("AGENT_SESSION_TOKEN", "token-1"),
            ("APP__TTS_ENABLED", "false"),
            ("APP__REQUEST_TIMEOUT_SECS", "30"),
            ("APP__VOICE_LANG", "en-GB"),
        ]),
    );
    assert_eq!(settings.server_url, "https://app.example.com");
    assert_eq!(settings.session_token.as_deref(), Some("token-1"));
    assert!(!settings.tts_enabled);
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(settings.voice.lang, "en-GB");
}

#[test]
fn unparseable_env_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        lookup_from(&[
            ("APP__TTS_ENABLED", "sometimes"),
            ("APP__REQUEST_TIMEOUT_SECS", "soon"),
        ]),
    );
    assert!(settings.tts_enabled);
    assert_eq!(settings.request_timeout_secs, None);
}

#[test]
fn zero_timeout_means_transport_default() {
    let settings = Settings {
        request_timeout_secs: Some(0),
        ..Settings::default()
    };
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn settings_file_overrides_defaults() {
    let path = temp_settings_file(
        "override",
        r#"
server_url = "https://vocal.example.com/"
session_token = "file-token"
tts_enabled = false

[voice]
rate = 1.2
lang = "fr-FR"
"#,
    );

    let mut settings = Settings::default();
    apply_file(&mut settings, &path).expect("apply file");
    assert_eq!(settings.server_url, "https://vocal.example.com/");
    assert_eq!(settings.session_token.as_deref(), Some("file-token"));
    assert!(!settings.tts_enabled);
    assert_eq!(settings.voice.rate, 1.2);
    assert_eq!(settings.voice.pitch, 1.0);
    assert_eq!(settings.voice.lang, "fr-FR");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn broken_settings_file_is_an_error() {
    let path = temp_settings_file("broken", "server_url = [");
    let mut settings = Settings::default();
    let err = apply_file(&mut settings, &path).expect_err("invalid toml");
    assert!(err.to_string().contains("failed to parse settings file"));
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn validate_server_url_normalizes_and_rejects() {
    assert_eq!(
        validate_server_url("  https://vocal.example.com/ ").expect("valid"),
        "https://vocal.example.com"
    );
    assert_eq!(
        validate_server_url("").expect("empty falls back"),
        "http://127.0.0.1:5050"
    );
    assert!(validate_server_url("localhost:5050").is_err());
    assert!(validate_server_url("ws://vocal.example.com").is_err());
}
