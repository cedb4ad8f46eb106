#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use speechgate::application::ports::{SpeechEngine, SpeechEngineError};
use speechgate::domain::TranscriptionRequest;
use speechgate::infrastructure::engines::OsNativeEngine;

fn write_recognizer(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("recognizer.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn given_recognizer_on_disk_when_transcribing_then_returns_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_recognizer(
        dir.path(),
        r#"bytes=$(wc -c | tr -d ' ')
echo "heard $bytes bytes in ${SPEECHGATE_LANGUAGE:-unknown}""#,
    );
    let engine = OsNativeEngine::new(script.to_string_lossy(), Vec::new());
    engine.initialize().await.unwrap();

    let transcript = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]).with_language("en-GB"))
        .await
        .unwrap();

    assert_eq!(transcript.text, "heard 3 bytes in en-GB");
    assert_eq!(transcript.language.as_deref(), Some("en-GB"));
}

#[tokio::test]
async fn given_recognizer_exits_nonzero_when_transcribing_then_returns_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_recognizer(dir.path(), "cat > /dev/null\necho 'no microphone' >&2\nexit 3");
    let engine = OsNativeEngine::new(script.to_string_lossy(), Vec::new());
    engine.initialize().await.unwrap();

    let result = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::TranscriptionFailed(msg)) if msg.contains("no microphone")));
}

#[tokio::test]
async fn given_recognizer_exits_without_reading_audio_when_transcribing_then_returns_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_recognizer(dir.path(), "echo 'audio device busy' >&2\nexit 4");
    let engine = OsNativeEngine::new(script.to_string_lossy(), Vec::new());
    engine.initialize().await.unwrap();

    let result = engine
        .transcribe(&TranscriptionRequest::new(vec![7; 4 * 1024 * 1024]))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::TranscriptionFailed(msg)) if msg.contains("audio device busy")));
}

#[tokio::test]
async fn given_missing_recognizer_when_initializing_then_unavailable() {
    let engine = OsNativeEngine::new("speechgate-recognizer-that-does-not-exist", Vec::new());

    let init = engine.initialize().await;
    let status = engine.status().await.unwrap();

    assert!(init.is_err());
    assert!(!engine.is_initialized());
    assert!(!status.is_available);
    assert!(status.message.contains("not found"));
}

#[tokio::test]
async fn given_uninitialized_engine_when_transcribing_then_not_initialized() {
    let engine = OsNativeEngine::new("sh", Vec::new());

    let result = engine
        .transcribe(&TranscriptionRequest::new(vec![1]))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::NotInitialized)));
}

#[tokio::test]
async fn given_recognizer_on_path_when_querying_status_then_available() {
    let engine = OsNativeEngine::new("sh", Vec::new());

    let status = engine.status().await.unwrap();

    assert!(status.is_available);
}
