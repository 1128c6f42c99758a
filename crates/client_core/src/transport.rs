use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::ActionParams,
    error::ServiceError,
    protocol::{
        ExecuteRequest, ExecuteResponse, ExecutionLogEntry, HealthResponse, LogsResponse,
        PlannerRequest, PlannerResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    config::Settings, CredentialProvider, ExecutorService, LogService, PlannerService,
    StaticCredentials,
};

const PLANNER_PATH: &str = "planner/run";
const EXECUTE_PATH: &str = "agent/execute";
const LOGS_PATH: &str = "logs";
const HEALTH_PATH: &str = "health";

pub struct AgentHttpClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl AgentHttpClient {
    pub fn new(
        server_url: &str,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut base_url = Url::parse(server_url.trim())
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("server url '{server_url}' must be an http(s) url");
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.server_url,
            Arc::new(StaticCredentials(settings.session_token.clone())),
            settings.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let url = self.endpoint(HEALTH_PATH)?;
        let health: HealthResponse = self.send(self.http.get(url)).await?;
        if health.is_ok() {
            Ok(health)
        } else {
            Err(ServiceError::rejected(format!(
                "backend reported status '{}'",
                health.status
            )))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::transport(format!("invalid endpoint '{path}': {e}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let request = match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json()
            .await
            .map_err(|e| ServiceError::transport(format!("malformed response body: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::transport(format!("request timed out: {err}"))
    } else if let Some(status) = err.status() {
        ServiceError::transport(format!("unexpected status {status}"))
    } else {
        ServiceError::transport(err.to_string())
    }
}

#[async_trait]
impl PlannerService for AgentHttpClient {
    async fn plan(&self, prompt: &str) -> Result<PlannerResponse, ServiceError> {
        let url = self.endpoint(PLANNER_PATH)?;
        debug!(%url, "posting planner request");
        self.send(self.http.post(url).json(&PlannerRequest {
            prompt: prompt.to_string(),
        }))
        .await
    }
}

#[async_trait]
impl ExecutorService for AgentHttpClient {
    async fn execute(
        &self,
        action: &str,
        params: &ActionParams,
    ) -> Result<ExecuteResponse, ServiceError> {
        let url = self.endpoint(EXECUTE_PATH)?;
        debug!(%url, action, "posting execute request");
        self.send(self.http.post(url).json(&ExecuteRequest {
            action: action.to_string(),
            params: params.clone(),
        }))
        .await
    }
}

#[async_trait]
impl LogService for AgentHttpClient {
    async fn fetch_logs(&self) -> Result<Vec<ExecutionLogEntry>, ServiceError> {
        let url = self.endpoint(LOGS_PATH)?;
        debug!(%url, "fetching execution logs");
        let response: LogsResponse = self.send(self.http.get(url)).await?;
        Ok(response.logs)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
