use shared::{
    domain::{ApprovalKind, ApprovalRequest},
    error::ServiceError,
    protocol::{PlannerResponse, ResponseKind},
};

pub const CONNECTIVITY_FAILURE_MESSAGE: &str = "Error connecting to backend ❌";
pub const PLANNER_ERROR_FALLBACK: &str = "Sorry, I couldn't handle that request.";

/// The single terminal effect of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerDecision {
    /// Final agent text for the transcript.
    Reply(String),
    /// Consent needed; carried by the gate, not the transcript.
    AwaitApproval(ApprovalRequest),
    /// Error entry for the transcript.
    Failure(String),
}

impl PlannerDecision {
    pub fn from_result(result: Result<PlannerResponse, ServiceError>) -> Self {
        match result {
            Ok(response) => classify(response),
            Err(_) => Self::Failure(CONNECTIVITY_FAILURE_MESSAGE.to_string()),
        }
    }

    pub fn spoken_text(&self) -> &str {
        match self {
            Self::Reply(text) | Self::Failure(text) => text,
            Self::AwaitApproval(request) => &request.prompt_text,
        }
    }
}

pub fn classify(response: PlannerResponse) -> PlannerDecision {
    let approval_kind = match response.response_type {
        ResponseKind::Result | ResponseKind::PlanOnly => {
            return match response.text() {
                Some(text) => PlannerDecision::Reply(text.to_string()),
                None => PlannerDecision::Failure(PLANNER_ERROR_FALLBACK.to_string()),
            };
        }
        ResponseKind::Approval => ApprovalKind::Confirm,
        ResponseKind::EmailPreview => ApprovalKind::EmailPreview,
        ResponseKind::CalendarPreview => ApprovalKind::CalendarPreview,
        ResponseKind::Error | ResponseKind::Unknown => return failure(&response),
    };

    let Some(action) = response
        .action
        .as_deref()
        .map(str::trim)
        .filter(|action| !action.is_empty())
    else {
        return failure(&response);
    };

    let prompt_text = response
        .message
        .as_deref()
        .or(response.response.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Approve {action}?"));

    PlannerDecision::AwaitApproval(
        ApprovalRequest::new(prompt_text, action, response.params.clone().unwrap_or_default())
            .with_kind(approval_kind),
    )
}

fn failure(response: &PlannerResponse) -> PlannerDecision {
    PlannerDecision::Failure(
        response
            .text()
            .map(str::to_string)
            .unwrap_or_else(|| PLANNER_ERROR_FALLBACK.to_string()),
    )
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
