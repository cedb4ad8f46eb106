use speechgate::application::ports::{SpeechEngine, SpeechEngineError};
use speechgate::domain::TranscriptionRequest;
use speechgate::infrastructure::engines::LocalWhisperEngine;

#[tokio::test]
async fn given_empty_model_dir_when_querying_status_then_lists_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let engine = LocalWhisperEngine::new(dir.path());

    let status = engine.status().await.unwrap();

    assert!(!status.is_available);
    assert!(status.message.contains("model.safetensors"));
    assert_eq!(engine.missing_files().len(), 4);
}

#[tokio::test]
async fn given_all_model_files_present_when_querying_status_then_available() {
    let dir = tempfile::tempdir().unwrap();
    for file in ["config.json", "tokenizer.json", "model.safetensors", "melfilters.bytes"] {
        std::fs::write(dir.path().join(file), b"").unwrap();
    }
    let engine = LocalWhisperEngine::new(dir.path());

    let status = engine.status().await.unwrap();

    assert!(status.is_available);
    assert_eq!(status.message, "model files present");
}

#[tokio::test]
async fn given_corrupt_model_files_when_initializing_then_model_load_failed() {
    let dir = tempfile::tempdir().unwrap();
    for file in ["config.json", "tokenizer.json", "model.safetensors", "melfilters.bytes"] {
        std::fs::write(dir.path().join(file), b"not a model").unwrap();
    }
    let engine = LocalWhisperEngine::new(dir.path());

    let result = engine.initialize().await;

    assert!(matches!(result, Err(SpeechEngineError::ModelLoadFailed(_))));
    assert!(!engine.is_initialized());
}

#[tokio::test]
async fn given_uninitialized_engine_when_transcribing_then_not_initialized() {
    let engine = LocalWhisperEngine::new("does/not/exist");

    let result = engine
        .transcribe(&TranscriptionRequest::new(vec![1, 2, 3]))
        .await;

    assert!(matches!(result, Err(SpeechEngineError::NotInitialized)));
}
