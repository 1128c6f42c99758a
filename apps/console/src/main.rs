use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::{self, Settings},
    history,
    quick_actions::quick_actions,
    speech::{MissingSpeechCapture, SpeechPlayback, Utterance},
    AgentHttpClient, AgentSession, ApprovalOutcome, DispatchOutcome, SessionAudioState,
    SessionEvent, SpeechBridge,
};
use shared::domain::{ActionParams, Sender, TranscriptEntry};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{error::RecvError, Receiver},
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// Settings file; defaults to ./agent.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    no_tts: bool,
}

/// Prints spoken feedback to the terminal.
struct ConsolePlayback;

impl SpeechPlayback for ConsolePlayback {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        println!("🔊 {}", utterance.text);
        Ok(())
    }

    fn cancel(&self) {}
}

fn load(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => config::load_settings_from(path)?,
        None => config::load_settings()?,
    };
    if let Some(url) = &args.server_url {
        settings.server_url = config::validate_server_url(url)?;
    }
    if args.token.is_some() {
        settings.session_token = args.token.clone();
    }
    if args.no_tts {
        settings.tts_enabled = false;
    }
    Ok(settings)
}

fn print_entry(entry: &TranscriptEntry) {
    let who = match entry.sender {
        Sender::User => "you",
        Sender::Agent => "agent",
    };
    println!("{who}> {}", entry.text);
}

async fn print_events(mut events: Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::EntryAppended(entry)) => {
                if entry.sender == Sender::Agent {
                    print_entry(&entry);
                }
            }
            Ok(SessionEvent::EntryResolved(entry)) => print_entry(&entry),
            Ok(SessionEvent::ApprovalOpened(request)) => {
                println!("agent> {}", request.prompt_text);
                println!("       action: {}", request.action);
                if let Ok(params) = serde_json::to_string_pretty(&request.params) {
                    for line in params.lines() {
                        println!("       {line}");
                    }
                }
                if request.is_editable() {
                    println!("       /approve [json params] to send, /reject to cancel");
                } else {
                    println!("       /approve or /reject");
                }
            }
            Ok(SessionEvent::TtsToggled(enabled)) => {
                println!("text-to-speech {}", if enabled { "on" } else { "off" });
            }
            Ok(SessionEvent::Reset) => println!("transcript cleared"),
            Ok(SessionEvent::ApprovalClosed) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "console fell behind session events"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn parse_params(raw: &str) -> Result<ActionParams> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("params must be a json object")?;
    value
        .as_object()
        .cloned()
        .context("params must be a json object")
}

async fn show_history(session: &AgentSession) {
    let state = session.history().fetch_logs().await;
    for line in history::render(&state) {
        println!("{line}");
    }
}

fn report_approval(outcome: ApprovalOutcome) {
    match outcome {
        ApprovalOutcome::NoRequest => println!("nothing awaiting approval"),
        ApprovalOutcome::Busy => println!("still working on the previous request"),
        ApprovalOutcome::Executed { .. } | ApprovalOutcome::Rejected(_) => {}
    }
}

fn report_dispatch(outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Busy => println!("still working on the previous request"),
        DispatchOutcome::AwaitingApproval => println!("approve or reject the pending action first"),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = load(&args)?;

    let client = AgentHttpClient::from_settings(&settings)?;
    if let Err(err) = client.health().await {
        warn!(error = %err, server_url = %settings.server_url, "agent server health check failed");
    }

    let speech = SpeechBridge::new(
        Arc::new(MissingSpeechCapture),
        Arc::new(ConsolePlayback),
        settings.voice.clone(),
    );
    let session = AgentSession::from_http(
        Arc::new(client),
        speech,
        SessionAudioState {
            tts_enabled: settings.tts_enabled,
        },
    );
    tokio::spawn(print_events(session.subscribe_events()));

    println!("connected to {}; type a request or /help", settings.server_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "/quit" | "/exit" => break,
            "/help" => println!(
                "/approve [json] /reject /history /tts /quick [label] /reset /quit"
            ),
            "/approve" if rest.trim().is_empty() => report_approval(session.approve().await),
            "/approve" => match parse_params(rest) {
                Ok(params) => report_approval(session.approve_with_params(params).await),
                Err(err) => println!("{err:#}"),
            },
            "/reject" => report_approval(session.reject().await),
            "/history" => show_history(&session).await,
            "/tts" => {
                session.toggle_tts().await;
            }
            "/reset" => {
                if !session.reset().await {
                    println!("still working on the previous request");
                }
            }
            "/quick" if rest.trim().is_empty() => {
                for action in quick_actions() {
                    println!("{:<10} {}", action.label, action.example);
                }
            }
            "/quick" => match session.dispatch_quick_action(rest).await {
                Some(outcome) => report_dispatch(outcome),
                None => println!("unknown quick action '{}'", rest.trim()),
            },
            _ => report_dispatch(session.dispatch(line).await),
        }
    }

    Ok(())
}
