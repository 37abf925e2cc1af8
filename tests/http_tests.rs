// HTTP API tests
//
// These tests exercise the router in-process with `tower::ServiceExt::oneshot`
// against a supervisor backed by the scripted recognizer.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use loqa_listen::recognition::{RecognitionResult, ScriptedProvider};
use loqa_listen::{
    create_router, AppState, ConversationMessage, RecognitionSettings, SupervisorConfig,
    SupervisorHandle, SupervisorState, WakeWordConfig,
};
use std::sync::Arc;
use tower::ServiceExt;

fn app(provider: &ScriptedProvider) -> (axum::Router, SupervisorHandle) {
    let supervisor = SupervisorHandle::spawn(
        Arc::new(provider.clone()),
        SupervisorConfig::default(),
        RecognitionSettings::default(),
        &WakeWordConfig::default(),
    )
    .unwrap();

    (create_router(AppState::new(supervisor.clone())), supervisor)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<&str>) -> Result<(StatusCode, Vec<u8>)> {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body)?).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;

    Ok((status, bytes.to_vec()))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (app, _supervisor) = app(&ScriptedProvider::new());

    let (status, body) = send(&app, "GET", "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    Ok(())
}

#[tokio::test]
async fn test_start_and_stop_listening() -> Result<()> {
    let provider = ScriptedProvider::new();
    let (app, _supervisor) = app(&provider);

    let (status, body) = send(&app, "POST", "/listen/start", None).await?;
    assert_eq!(status, StatusCode::OK);
    let state: SupervisorState = serde_json::from_slice(&body)?;
    assert!(state.is_listening);
    assert!(state.has_support);
    assert_eq!(provider.live_sessions(), 1);

    let (status, body) = send(&app, "POST", "/listen/stop", None).await?;
    assert_eq!(status, StatusCode::OK);
    let state: SupervisorState = serde_json::from_slice(&body)?;
    assert!(!state.is_listening);
    assert_eq!(provider.live_sessions(), 0);

    Ok(())
}

#[tokio::test]
async fn test_set_enabled() -> Result<()> {
    let provider = ScriptedProvider::new();
    let (app, _supervisor) = app(&provider);

    let (status, body) = send(&app, "POST", "/listen/enabled", Some(r#"{"enabled": false}"#)).await?;
    assert_eq!(status, StatusCode::OK);
    let state: SupervisorState = serde_json::from_slice(&body)?;
    assert!(!state.enabled);

    // Start is a no-op while disabled
    send(&app, "POST", "/listen/start", None).await?;
    assert_eq!(provider.session_count(), 0);

    let (_, body) = send(&app, "POST", "/listen/enabled", Some(r#"{"enabled": true}"#)).await?;
    let state: SupervisorState = serde_json::from_slice(&body)?;
    assert!(state.enabled);
    assert!(state.is_listening);
    assert_eq!(provider.session_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_state_and_messages() -> Result<()> {
    let provider = ScriptedProvider::new();
    let (app, supervisor) = app(&provider);

    supervisor.start().await?;
    provider
        .latest()
        .expect("session created")
        .emit_results(0, vec![RecognitionResult::finalized("hey victoria turn on the lights")]);
    supervisor.snapshot().await?;

    let (status, body) = send(&app, "GET", "/state", None).await?;
    assert_eq!(status, StatusCode::OK);
    let state: SupervisorState = serde_json::from_slice(&body)?;
    assert_eq!(state.transcript, "hey victoria turn on the lights");
    assert!(state.wake_detected);

    let (status, body) = send(&app, "GET", "/messages", None).await?;
    assert_eq!(status, StatusCode::OK);
    let messages: Vec<ConversationMessage> = serde_json::from_slice(&body)?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "turn on the lights");

    Ok(())
}

#[tokio::test]
async fn test_start_refused_without_support() -> Result<()> {
    let provider = ScriptedProvider::unsupported();
    let (app, _supervisor) = app(&provider);

    let (status, body) = send(&app, "POST", "/listen/start", None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error: serde_json::Value = serde_json::from_slice(&body)?;
    assert!(error["error"].as_str().unwrap().contains("not supported"));
    assert_eq!(provider.session_count(), 0);

    let (_, body) = send(&app, "GET", "/state", None).await?;
    let state: SupervisorState = serde_json::from_slice(&body)?;
    assert!(!state.has_support);
    assert!(state.error.is_some());

    Ok(())
}

#[tokio::test]
async fn test_invalid_enabled_body() -> Result<()> {
    let (app, _supervisor) = app(&ScriptedProvider::new());

    let (status, _) = send(&app, "POST", "/listen/enabled", Some(r#"{"enabled": "yes"}"#)).await?;

    assert!(status.is_client_error());

    Ok(())
}
