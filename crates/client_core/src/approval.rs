use shared::domain::{ActionParams, ApprovalRequest};
use tracing::error;

use crate::error::InvariantViolation;

pub const REJECTED_MESSAGE: &str = "❌ Action rejected. Task cancelled.";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GateState {
    #[default]
    Closed,
    Open(ApprovalRequest),
}

#[derive(Debug, Default)]
pub struct ApprovalGate {
    state: GateState,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, GateState::Open(_))
    }

    pub fn current(&self) -> Option<&ApprovalRequest> {
        match &self.state {
            GateState::Open(request) => Some(request),
            GateState::Closed => None,
        }
    }

    /// Opens the gate. The held request is left untouched if one is already outstanding.
    pub fn open(&mut self, request: ApprovalRequest) -> Result<(), InvariantViolation> {
        if let GateState::Open(outstanding) = &self.state {
            let violation = InvariantViolation::ApprovalAlreadyOpen {
                outstanding_action: outstanding.action.clone(),
            };
            error!(%violation, rejected_action = %request.action, "approval gate opened twice");
            return Err(violation);
        }
        self.state = GateState::Open(request);
        Ok(())
    }

    /// Closes the gate and yields the request to execute. `None` while closed.
    pub fn approve(&mut self) -> Option<ApprovalRequest> {
        self.take()
    }

    /// Like [`ApprovalGate::approve`], with parameters edited by the user.
    pub fn approve_with_params(&mut self, params: ActionParams) -> Option<ApprovalRequest> {
        let mut request = self.take()?;
        request.params = params;
        Some(request)
    }

    /// Closes the gate without executing. `None` while closed.
    pub fn reject(&mut self) -> Option<ApprovalRequest> {
        self.take()
    }

    fn take(&mut self) -> Option<ApprovalRequest> {
        match std::mem::take(&mut self.state) {
            GateState::Open(request) => Some(request),
            GateState::Closed => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/approval_tests.rs"]
mod tests;
