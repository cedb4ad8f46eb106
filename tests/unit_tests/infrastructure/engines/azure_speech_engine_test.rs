use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use speechgate::application::ports::{SpeechEngine, SpeechEngineError};
use speechgate::domain::TranscriptionRequest;
use speechgate::infrastructure::engines::AzureSpeechEngine;

async fn start_mock_azure_server(
    response_status: u16,
    response_body: &'static str,
) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new().route(
        "/openai/deployments/my-deployment/audio/transcriptions",
        post(move |headers: HeaderMap| async move {
            if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
                return (StatusCode::UNAUTHORIZED, "missing api-key").into_response();
            }
            let status = StatusCode::from_u16(response_status).unwrap();
            (status, response_body).into_response()
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (base_url, shutdown_tx)
}

fn engine(base_url: Option<String>, key: Option<&str>) -> AzureSpeechEngine {
    AzureSpeechEngine::new(
        base_url,
        "my-deployment",
        key.map(str::to_string),
        "2024-06-01",
    )
}

#[tokio::test]
async fn given_valid_audio_bytes_when_azure_transcribes_then_returns_text() {
    let (base_url, shutdown_tx) =
        start_mock_azure_server(200, r#"{"text": "Hello from Azure Whisper"}"#).await;
    let engine = engine(Some(base_url), Some("test-key"));
    engine.initialize().await.unwrap();

    let transcript = engine
        .transcribe(&TranscriptionRequest::new(b"fake audio bytes".to_vec()))
        .await
        .unwrap();

    assert_eq!(transcript.text, "Hello from Azure Whisper");
    assert_eq!(transcript.confidence, None);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_azure_api_returns_error_status_when_transcribing_then_returns_api_error() {
    let body = r#"{"error": {"code": "InvalidRequest", "message": "bad audio"}}"#;
    let (base_url, shutdown_tx) = start_mock_azure_server(400, body).await;
    let engine = engine(Some(base_url), Some("test-key"));
    engine.initialize().await.unwrap();

    let result = engine
        .transcribe(&TranscriptionRequest::new(b"bad audio".to_vec()))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::ApiRequestFailed(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_azure_api_returns_empty_text_when_transcribing_then_returns_empty_transcript() {
    let (base_url, shutdown_tx) = start_mock_azure_server(200, r#"{"text": ""}"#).await;
    let engine = engine(Some(base_url), Some("test-key"));
    engine.initialize().await.unwrap();

    let transcript = engine
        .transcribe(&TranscriptionRequest::new(b"silent audio".to_vec()))
        .await
        .unwrap();

    assert_eq!(transcript.text, "");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_missing_endpoint_when_initializing_then_missing_credentials() {
    let engine = engine(None, Some("test-key"));

    let result = engine.initialize().await;
    let status = engine.status().await.unwrap();

    assert!(matches!(result, Err(SpeechEngineError::MissingCredentials(msg)) if msg.contains("endpoint")));
    assert!(!status.is_available);
}

#[tokio::test]
async fn given_missing_key_when_querying_status_then_unavailable() {
    let engine = engine(Some("http://127.0.0.1:9".to_string()), None);

    let status = engine.status().await.unwrap();

    assert!(!status.is_available);
    assert!(status.message.contains("Azure API key"));
}

#[tokio::test]
async fn given_configured_reachable_endpoint_when_querying_status_then_available() {
    let (base_url, shutdown_tx) = start_mock_azure_server(200, "{}").await;
    let engine = engine(Some(format!("{}/", base_url)), Some("test-key"));

    let status = engine.status().await.unwrap();

    assert!(status.is_available);
    assert_eq!(status.version.as_deref(), Some("2024-06-01"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_configured_endpoint_unreachable_when_querying_status_then_returns_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let engine = engine(Some(format!("http://{}", addr)), Some("test-key"));

    let result = engine.status().await;

    assert!(matches!(result, Err(SpeechEngineError::Unreachable(_))));
}
