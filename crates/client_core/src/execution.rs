use shared::{
    domain::{EntryId, TranscriptEntry},
    error::ServiceError,
    protocol::ExecuteResponse,
};
use tracing::warn;

use crate::{error::InvariantViolation, transcript::TranscriptStore};

pub const ACTION_FAILED_MESSAGE: &str = "Action failed ❌";
pub const ACTION_COMPLETED_FALLBACK: &str = "Action completed ✅";

pub fn pending_text(action: &str) -> String {
    format!("Executing {action}…")
}

/// The pending entry created for one execution; resolution goes through its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExecution {
    pub entry_id: EntryId,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResolution {
    pub text: String,
    pub details: Option<serde_json::Value>,
    pub succeeded: bool,
}

impl ExecutionResolution {
    pub fn from_result(action: &str, result: Result<ExecuteResponse, ServiceError>) -> Self {
        match result {
            Ok(response) if response.success => Self {
                text: response
                    .message
                    .map(|message| message.trim().to_string())
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| ACTION_COMPLETED_FALLBACK.to_string()),
                details: response.details,
                succeeded: true,
            },
            Ok(response) => {
                warn!(
                    action,
                    reported = response.message.as_deref().unwrap_or_default(),
                    "executor reported failure"
                );
                Self::failed()
            }
            Err(err) => {
                warn!(action, error = %err, "executor call failed");
                Self::failed()
            }
        }
    }

    fn failed() -> Self {
        Self {
            text: ACTION_FAILED_MESSAGE.to_string(),
            details: None,
            succeeded: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExecutionTracker;

impl ExecutionTracker {
    /// Appends the pending entry for `action`.
    pub fn begin(
        transcript: &mut TranscriptStore,
        action: &str,
    ) -> Result<PendingExecution, InvariantViolation> {
        let entry_id = transcript.push_pending(pending_text(action))?;
        Ok(PendingExecution {
            entry_id,
            action: action.to_string(),
        })
    }

    /// Resolves exactly the entry created by [`ExecutionTracker::begin`].
    pub fn finish(
        transcript: &mut TranscriptStore,
        pending: &PendingExecution,
        resolution: ExecutionResolution,
    ) -> Result<TranscriptEntry, InvariantViolation> {
        transcript
            .resolve(pending.entry_id, resolution.text, resolution.details)
            .cloned()
    }
}

#[cfg(test)]
#[path = "tests/execution_tests.rs"]
mod tests;
