use super::*;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

#[test]
fn blank_static_token_is_not_sent() {
    assert_eq!(StaticCredentials(None).bearer_token(), None);
    assert_eq!(StaticCredentials(Some("  ".into())).bearer_token(), None);
    assert_eq!(
        StaticCredentials(Some("token-1".into())).bearer_token().as_deref(),
        Some("token-1")
    );
}

#[tokio::test]
async fn missing_services_fail_as_transport_errors() {
    assert!(MissingPlanner
        .plan("hello")
        .await
        .expect_err("no planner")
        .is_transport());
    assert!(MissingExecutor
        .execute("GMAIL_SEND", &ActionParams::new())
        .await
        .expect_err("no executor")
        .is_transport());
    assert!(MissingLogService
        .fetch_logs()
        .await
        .expect_err("no logs")
        .is_transport());
}

#[tokio::test]
async fn session_without_backend_reports_connectivity_failure() {
    let session = AgentSession::new(
        Arc::new(MissingPlanner),
        Arc::new(MissingExecutor),
        Arc::new(MissingLogService),
        SpeechBridge::silent(),
        SessionAudioState::default(),
    );

    let outcome = session.dispatch("send email to john").await;
    let transcript = session.transcript().await;
    assert_eq!(outcome, DispatchOutcome::Failed(transcript[1].id));
    assert_eq!(
        transcript[1].text,
        dispatcher::CONNECTIVITY_FAILURE_MESSAGE
    );
}

async fn spawn_backend() -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(
            "/planner/run",
            post(|Json(_body): Json<Value>| async {
                Json(json!({
                    "response_type": "EMAIL_PREVIEW",
                    "message": "Review the draft",
                    "action": "GMAIL_SEND",
                    "params": { "to": ["john@example.com"], "subject": "Hello" }
                }))
            }),
        )
        .route(
            "/agent/execute",
            post(|Json(body): Json<Value>| async move {
                let subject = body["params"]["subject"].as_str().unwrap_or_default().to_string();
                Json(json!({ "success": true, "message": format!("Sent '{subject}'") }))
            }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn http_session_previews_edits_and_executes() {
    let server_url = spawn_backend().await.expect("spawn backend");
    let client = AgentHttpClient::new(&server_url, Arc::new(StaticCredentials(None)), None)
        .expect("client");
    let session = AgentSession::from_http(
        Arc::new(client),
        SpeechBridge::silent(),
        SessionAudioState::default(),
    );

    assert_eq!(
        session.dispatch("email john").await,
        DispatchOutcome::ApprovalRequested
    );
    let mut request = session.pending_approval().await.expect("preview open");
    assert!(request.is_editable());
    request
        .params
        .insert("subject".into(), Value::String("Edited".into()));

    let outcome = session.approve_with_params(request.params).await;
    assert!(matches!(
        outcome,
        ApprovalOutcome::Executed {
            succeeded: true,
            ..
        }
    ));
    let last = session.transcript().await.pop().expect("resolved entry");
    assert_eq!(last.text, "Sent 'Edited'");
}
