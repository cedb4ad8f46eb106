use async_trait::async_trait;

use crate::domain::{EngineDescriptor, EngineStatus, TranscriptionRequest};

/// Raw adapter output, before the selector normalizes it into a
/// [`TranscriptionResult`](crate::domain::TranscriptionResult).
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: Option<f32>,
    pub language: Option<String>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            language: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// One speech-to-text backend behind a uniform contract.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn descriptor(&self) -> &EngineDescriptor;

    /// Prepares the engine for use. Calling it again after success is a no-op.
    async fn initialize(&self) -> Result<(), SpeechEngineError>;

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Transcript, SpeechEngineError>;

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError>;

    fn is_initialized(&self) -> bool;

    /// Only engines capturing audio continuously ever report `true`.
    fn is_listening(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SpeechEngineError {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
    #[error("engine unreachable: {0}")]
    Unreachable(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("engine not initialized")]
    NotInitialized,
}

impl SpeechEngineError {
    /// True when the failure needs operator action (credentials, model files)
    /// rather than a retry.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SpeechEngineError::MissingCredentials(_) | SpeechEngineError::ModelLoadFailed(_)
        )
    }
}
