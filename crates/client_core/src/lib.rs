use async_trait::async_trait;
use shared::{
    domain::ActionParams,
    error::ServiceError,
    protocol::{ExecuteResponse, ExecutionLogEntry, PlannerResponse},
};

pub mod approval;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod execution;
pub mod history;
pub mod quick_actions;
pub mod session;
pub mod speech;
pub mod transcript;
pub mod transport;

pub use session::{AgentSession, ApprovalOutcome, DispatchOutcome, SessionEvent};
pub use speech::{SessionAudioState, SpeechBridge, SpeechCapture, SpeechPlayback, Utterance};
pub use transport::AgentHttpClient;

#[async_trait]
pub trait PlannerService: Send + Sync {
    async fn plan(&self, prompt: &str) -> Result<PlannerResponse, ServiceError>;
}

#[async_trait]
pub trait ExecutorService: Send + Sync {
    async fn execute(
        &self,
        action: &str,
        params: &ActionParams,
    ) -> Result<ExecuteResponse, ServiceError>;
}

#[async_trait]
pub trait LogService: Send + Sync {
    /// Past executions in the order the log store returns them.
    async fn fetch_logs(&self) -> Result<Vec<ExecutionLogEntry>, ServiceError>;
}

/// Supplies the bearer credential attached to every outgoing request.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<String>);

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone().filter(|token| !token.trim().is_empty())
    }
}

pub struct MissingPlanner;

#[async_trait]
impl PlannerService for MissingPlanner {
    async fn plan(&self, _prompt: &str) -> Result<PlannerResponse, ServiceError> {
        Err(ServiceError::transport("planner service is unavailable"))
    }
}

pub struct MissingExecutor;

#[async_trait]
impl ExecutorService for MissingExecutor {
    async fn execute(
        &self,
        action: &str,
        _params: &ActionParams,
    ) -> Result<ExecuteResponse, ServiceError> {
        Err(ServiceError::transport(format!(
            "executor service is unavailable for action {action}"
        )))
    }
}

pub struct MissingLogService;

#[async_trait]
impl LogService for MissingLogService {
    async fn fetch_logs(&self) -> Result<Vec<ExecutionLogEntry>, ServiceError> {
        Err(ServiceError::transport("log service is unavailable"))
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
