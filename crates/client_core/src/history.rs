use std::sync::Arc;

use shared::protocol::{ExecutionLogEntry, LogStatus};
use tracing::warn;

use crate::LogService;

pub const HISTORY_LOAD_FAILED: &str = "Failed to load execution history";
pub const HISTORY_EMPTY: &str = "No execution history yet. Try running some commands!";

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryState {
    Loaded(Vec<ExecutionLogEntry>),
    Failed(String),
}

pub struct HistoryViewer {
    logs: Arc<dyn LogService>,
}

impl HistoryViewer {
    pub fn new(logs: Arc<dyn LogService>) -> Self {
        Self { logs }
    }

    /// Entries in the order the log service returned them. Call again to retry.
    pub async fn fetch_logs(&self) -> HistoryState {
        match self.logs.fetch_logs().await {
            Ok(entries) => HistoryState::Loaded(entries),
            Err(err) => {
                warn!(error = %err, "failed to fetch execution logs");
                HistoryState::Failed(HISTORY_LOAD_FAILED.to_string())
            }
        }
    }
}

pub fn status_icon(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Success => "✓",
        LogStatus::Failed => "✗",
        LogStatus::Attempting => "⏳",
        LogStatus::Unknown => "○",
    }
}

pub fn status_label(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Success => "SUCCESS",
        LogStatus::Failed => "FAILED",
        LogStatus::Attempting => "ATTEMPTING",
        LogStatus::Unknown => "UNKNOWN",
    }
}

/// `"<icon> <action> [<STATUS>] <local time>"`; unparseable timestamps are shown verbatim.
pub fn summary_line(entry: &ExecutionLogEntry) -> String {
    let when = entry
        .parsed_timestamp()
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| entry.timestamp.clone());
    format!(
        "{} {} [{}] {}",
        status_icon(entry.status),
        entry.action,
        status_label(entry.status),
        when
    )
}

pub fn details_block(entry: &ExecutionLogEntry) -> Option<String> {
    entry
        .details
        .as_ref()
        .and_then(|details| serde_json::to_string_pretty(details).ok())
}

pub fn render(state: &HistoryState) -> Vec<String> {
    match state {
        HistoryState::Failed(message) => vec![message.clone()],
        HistoryState::Loaded(entries) if entries.is_empty() => vec![HISTORY_EMPTY.to_string()],
        HistoryState::Loaded(entries) => entries
            .iter()
            .flat_map(|entry| {
                let mut lines = vec![summary_line(entry)];
                if let Some(details) = details_block(entry) {
                    lines.extend(details.lines().map(|line| format!("    {line}")));
                }
                lines
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
