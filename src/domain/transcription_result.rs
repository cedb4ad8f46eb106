use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::EngineId;

/// Language code reported when neither the engine nor the caller supplied one.
pub const UNDETERMINED_LANGUAGE: &str = "und";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotInitialized,
    InvalidRequest,
    TranscriptionFailed,
    Cancelled,
    Timeout,
    EmptyTranscript,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotInitialized => "not_initialized",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::TranscriptionFailed => "transcription_failed",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Timeout => "timeout",
            FailureKind::EmptyTranscript => "empty_transcript",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized outcome of one transcription call.
///
/// Only constructible through [`TranscriptionResult::success`] and
/// [`TranscriptionResult::failure`], which keep `success`, `text` and
/// `error_message` consistent with each other.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResult {
    text: String,
    confidence: f32,
    language: String,
    engine: EngineId,
    success: bool,
    error_message: Option<String>,
    failure: Option<FailureKind>,
    word_count: usize,
    #[serde(rename = "processing_time_ms", serialize_with = "serialize_millis")]
    processing_time: Duration,
}

impl TranscriptionResult {
    /// Blank text is reported as an [`FailureKind::EmptyTranscript`] failure.
    pub fn success(
        engine: EngineId,
        text: impl Into<String>,
        confidence: f32,
        language: impl Into<String>,
        processing_time: Duration,
    ) -> Self {
        let text = text.into().trim().to_string();
        let language = language.into();
        if text.is_empty() {
            return Self::failure(
                engine,
                FailureKind::EmptyTranscript,
                "engine returned no speech",
                language,
                processing_time,
            );
        }

        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            word_count: count_words(&text),
            text,
            confidence,
            language,
            engine,
            success: true,
            error_message: None,
            failure: None,
            processing_time,
        }
    }

    pub fn failure(
        engine: EngineId,
        kind: FailureKind,
        message: impl Into<String>,
        language: impl Into<String>,
        processing_time: Duration,
    ) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = kind.as_str().replace('_', " ");
        }

        Self {
            text: String::new(),
            confidence: 0.0,
            language: language.into(),
            engine,
            success: false,
            error_message: Some(message),
            failure: Some(kind),
            word_count: 0,
            processing_time,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn engine(&self) -> EngineId {
        self.engine
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
