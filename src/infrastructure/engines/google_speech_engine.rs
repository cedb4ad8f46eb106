use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::application::ports::{SpeechEngine, SpeechEngineError, Transcript};
use crate::domain::{EngineDescriptor, EngineId, EngineStatus, TranscriptionRequest};

use super::catalog;
use super::http_support::{check_status, probe, require_key};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Cloud Speech-to-Text v1, synchronous `speech:recognize`.
pub struct GoogleSpeechEngine {
    descriptor: EngineDescriptor,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    default_language: String,
    initialized: AtomicBool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    language_code: &'a str,
    enable_automatic_punctuation: bool,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
    #[serde(default)]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl GoogleSpeechEngine {
    pub fn new(api_key: Option<String>, base_url: Option<String>, default_language: &str) -> Self {
        Self {
            descriptor: catalog::descriptor(EngineId::Google),
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://speech.googleapis.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            default_language: default_language.to_string(),
            initialized: AtomicBool::new(false),
        }
    }

    fn key(&self) -> Result<&str, SpeechEngineError> {
        require_key(self.api_key.as_deref(), "Google API key")
    }
}

impl RecognizeResponse {
    /// Joins the best alternative of every result; confidence is their mean.
    fn into_transcript(self, fallback_language: &str) -> Transcript {
        let mut pieces = Vec::new();
        let mut confidences = Vec::new();
        let mut language = None;

        for result in self.results {
            if language.is_none() {
                language = result.language_code;
            }
            if let Some(best) = result.alternatives.into_iter().next() {
                let text = best.transcript.trim().to_string();
                if !text.is_empty() {
                    pieces.push(text);
                }
                confidences.extend(best.confidence);
            }
        }

        let confidence = (!confidences.is_empty())
            .then(|| confidences.iter().sum::<f32>() / confidences.len() as f32);

        Transcript {
            text: pieces.join(" "),
            confidence,
            language: Some(language.unwrap_or_else(|| fallback_language.to_string())),
        }
    }
}

#[async_trait]
impl SpeechEngine for GoogleSpeechEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> Result<(), SpeechEngineError> {
        self.key()?;
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(language = %self.default_language, "Google Speech engine ready");
        Ok(())
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Transcript, SpeechEngineError> {
        if !self.is_initialized() {
            return Err(SpeechEngineError::NotInitialized);
        }
        let key = self.key()?;
        let language = request
            .language
            .as_deref()
            .unwrap_or(&self.default_language);

        let body = RecognizeRequest {
            config: RecognitionConfig {
                language_code: language,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(&request.audio),
            },
        };

        tracing::debug!(language = %language, bytes = request.audio.len(), "Sending audio to Google Speech");

        let response = self
            .client
            .post(format!("{}/speech:recognize", self.base_url))
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("request: {}", e.without_url())))?;

        let parsed: RecognizeResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("parse response: {}", e)))?;

        let transcript = parsed.into_transcript(language);
        tracing::info!(chars = transcript.text.len(), "Google Speech transcription completed");

        Ok(transcript)
    }

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError> {
        let id = self.descriptor.id;
        if let Err(e) = self.key() {
            return Ok(EngineStatus::unavailable(id, e.to_string()));
        }
        let http = probe(&self.client, &self.base_url).await?;
        Ok(EngineStatus::available(
            id,
            Some("v1".to_string()),
            format!("api reachable ({})", http.as_u16()),
        ))
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
