use axum::Router;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use speechgate::application::ports::{SpeechEngine, SpeechEngineError};
use speechgate::domain::TranscriptionRequest;
use speechgate::infrastructure::engines::GoogleSpeechEngine;

/// Echoes the requested language code back as the recognized transcript so
/// tests can see what was sent.
async fn start_mock_google_server(response_status: u16) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: String| async move {
        if !uri.path().ends_with("/speech:recognize") {
            return (StatusCode::NOT_FOUND, String::new()).into_response();
        }
        let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
        if key != Some("g-key") || uri.query().is_some() {
            return (StatusCode::FORBIDDEN, "API key not valid".to_string()).into_response();
        }
        let status = StatusCode::from_u16(response_status).unwrap();
        if !status.is_success() {
            return (status, r#"{"error":{"message":"invalid audio"}}"#.to_string()).into_response();
        }

        let request: serde_json::Value = serde_json::from_str(&body).unwrap();
        let language = request["config"]["languageCode"].as_str().unwrap_or("none");
        let has_audio = request["audio"]["content"].as_str().is_some_and(|c| !c.is_empty());
        let reply = serde_json::json!({
            "results": [{
                "alternatives": [{ "transcript": format!("language {}", language), "confidence": 0.75 }],
                "languageCode": language.to_lowercase(),
            }, {
                "alternatives": [{ "transcript": format!("audio {}", has_audio), "confidence": 0.25 }],
            }]
        });
        (StatusCode::OK, reply.to_string()).into_response()
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}/v1", addr);

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

async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

#[tokio::test]
async fn given_recognize_results_when_transcribing_then_joins_best_alternatives() {
    let (base_url, shutdown_tx) = start_mock_google_server(200).await;
    let engine = GoogleSpeechEngine::new(Some("g-key".to_string()), Some(base_url), "en-US");
    engine.initialize().await.unwrap();

    let transcript = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]))
        .await
        .unwrap();

    assert_eq!(transcript.text, "language en-US audio true");
    assert!((transcript.confidence.unwrap() - 0.5).abs() < 1e-6);
    assert_eq!(transcript.language.as_deref(), Some("en-us"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_language_hint_when_transcribing_then_hint_overrides_default() {
    let (base_url, shutdown_tx) = start_mock_google_server(200).await;
    let engine = GoogleSpeechEngine::new(Some("g-key".to_string()), Some(base_url), "en-US");
    engine.initialize().await.unwrap();

    let transcript = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]).with_language("nb-NO"))
        .await
        .unwrap();

    assert!(transcript.text.starts_with("language nb-NO"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_api_error_when_transcribing_then_returns_api_error() {
    let (base_url, shutdown_tx) = start_mock_google_server(400).await;
    let engine = GoogleSpeechEngine::new(Some("g-key".to_string()), Some(base_url), "en-US");
    engine.initialize().await.unwrap();

    let result = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::ApiRequestFailed(msg)) if msg.contains("invalid audio")));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_wrong_key_when_transcribing_then_returns_missing_credentials() {
    let (base_url, shutdown_tx) = start_mock_google_server(200).await;
    let engine = GoogleSpeechEngine::new(Some("other".to_string()), Some(base_url), "en-US");
    engine.initialize().await.unwrap();

    let result = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::MissingCredentials(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_no_key_when_initializing_then_fails_and_status_unavailable() {
    let engine = GoogleSpeechEngine::new(Some(String::new()), None, "en-US");

    assert!(engine.initialize().await.is_err());
    let status = engine.status().await.unwrap();
    assert!(!status.is_available);
}

#[tokio::test]
async fn given_reachable_api_when_querying_status_then_available() {
    let (base_url, shutdown_tx) = start_mock_google_server(200).await;
    let engine = GoogleSpeechEngine::new(Some("g-key".to_string()), Some(base_url), "en-US");

    let status = engine.status().await.unwrap();

    assert!(status.is_available);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unreachable_api_when_transcribing_then_error_does_not_leak_key() {
    let engine = GoogleSpeechEngine::new(
        Some("SUPERSECRETKEY".to_string()),
        Some(closed_port_url().await),
        "en-US",
    );
    engine.initialize().await.unwrap();

    let err = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]))
        .await
        .unwrap_err();

    assert!(matches!(err, SpeechEngineError::ApiRequestFailed(_)));
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
}

#[tokio::test]
async fn given_unreachable_api_when_querying_status_then_returns_unreachable() {
    let engine = GoogleSpeechEngine::new(Some("g-key".to_string()), Some(closed_port_url().await), "en-US");

    let result = engine.status().await;

    assert!(matches!(result, Err(SpeechEngineError::Unreachable(_))));
}
