use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::multipart;

use crate::application::ports::{SpeechEngine, SpeechEngineError, Transcript};
use crate::domain::{EngineDescriptor, EngineId, EngineStatus, TranscriptionRequest};

use super::catalog;
use super::http_support::{check_status, probe, require_key};
use super::language::primary_subtag;
use super::whisper_response::VerboseTranscription;

pub struct OpenAiWhisperEngine {
    descriptor: EngineDescriptor,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    initialized: AtomicBool,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: Option<String>, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            descriptor: catalog::descriptor(EngineId::OpenAi),
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
            initialized: AtomicBool::new(false),
        }
    }

    fn key(&self) -> Result<&str, SpeechEngineError> {
        require_key(self.api_key.as_deref(), "OpenAI API key")
    }
}

#[async_trait]
impl SpeechEngine for OpenAiWhisperEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> Result<(), SpeechEngineError> {
        self.key()?;
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(model = %self.model, "OpenAI Whisper engine ready");
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
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = multipart::Part::bytes(request.audio.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", file_part);
        if let Some(language) = request.language.as_deref() {
            form = form.text("language", primary_subtag(language).to_string());
        }

        tracing::debug!(model = %self.model, bytes = request.audio.len(), "Sending audio to OpenAI Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("request: {}", e.without_url())))?;

        let body: VerboseTranscription = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("parse response: {}", e)))?;

        tracing::info!(chars = body.text.len(), "OpenAI Whisper transcription completed");

        Ok(body.into_transcript(request.language.as_deref()))
    }

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError> {
        let id = self.descriptor.id;
        if let Err(e) = self.key() {
            return Ok(EngineStatus::unavailable(id, e.to_string()));
        }
        let http = probe(&self.client, &self.base_url).await?;
        Ok(EngineStatus::available(
            id,
            Some(self.model.clone()),
            format!("api reachable ({})", http.as_u16()),
        ))
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
