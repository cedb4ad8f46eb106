use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::multipart;

use crate::application::ports::{SpeechEngine, SpeechEngineError, Transcript};
use crate::domain::{EngineDescriptor, EngineId, EngineStatus, TranscriptionRequest};

use super::catalog;
use super::http_support::{check_status, probe, require_key};
use super::language::primary_subtag;
use super::whisper_response::VerboseTranscription;

/// Whisper deployment hosted on Azure OpenAI.
pub struct AzureSpeechEngine {
    descriptor: EngineDescriptor,
    client: reqwest::Client,
    base_url: Option<String>,
    deployment: String,
    api_key: Option<String>,
    api_version: String,
    initialized: AtomicBool,
}

impl AzureSpeechEngine {
    pub fn new(
        base_url: Option<String>,
        deployment: &str,
        api_key: Option<String>,
        api_version: &str,
    ) -> Self {
        Self {
            descriptor: catalog::descriptor(EngineId::Azure),
            client: reqwest::Client::new(),
            base_url: base_url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            deployment: deployment.to_string(),
            api_key,
            api_version: api_version.to_string(),
            initialized: AtomicBool::new(false),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), SpeechEngineError> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            SpeechEngineError::MissingCredentials("Azure endpoint is not configured".to_string())
        })?;
        let key = require_key(self.api_key.as_deref(), "Azure API key")?;
        Ok((base_url, key))
    }

    fn transcription_url(&self, base_url: &str) -> String {
        format!(
            "{}/openai/deployments/{}/audio/transcriptions?api-version={}",
            base_url, self.deployment, self.api_version,
        )
    }
}

#[async_trait]
impl SpeechEngine for AzureSpeechEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> Result<(), SpeechEngineError> {
        self.credentials()?;
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(deployment = %self.deployment, "Azure OpenAI Whisper engine ready");
        Ok(())
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Transcript, SpeechEngineError> {
        if !self.is_initialized() {
            return Err(SpeechEngineError::NotInitialized);
        }
        let (base_url, key) = self.credentials()?;
        let endpoint = self.transcription_url(base_url);

        let file_part = multipart::Part::bytes(request.audio.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("response_format", "verbose_json")
            .part("file", file_part);
        if let Some(language) = request.language.as_deref() {
            form = form.text("language", primary_subtag(language).to_string());
        }

        tracing::debug!(endpoint = %endpoint, "Sending audio to Azure OpenAI Whisper");

        let response = self
            .client
            .post(&endpoint)
            .header("api-key", key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("request: {}", e.without_url())))?;

        let body: VerboseTranscription = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpeechEngineError::ApiRequestFailed(format!("parse response: {}", e)))?;

        tracing::info!(
            chars = body.text.len(),
            "Azure OpenAI Whisper transcription completed"
        );

        Ok(body.into_transcript(request.language.as_deref()))
    }

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError> {
        let id = self.descriptor.id;
        let (base_url, _) = match self.credentials() {
            Ok(c) => c,
            Err(e) => return Ok(EngineStatus::unavailable(id, e.to_string())),
        };
        let http = probe(&self.client, base_url).await?;
        Ok(EngineStatus::available(
            id,
            Some(self.api_version.clone()),
            format!("endpoint reachable ({})", http.as_u16()),
        ))
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
