use std::sync::Arc;

use crate::application::ports::SpeechEngine;
use crate::domain::EngineId;
use crate::presentation::config::{EnginesSettings, SelectorSettings};

use super::azure_speech_engine::AzureSpeechEngine;
use super::google_speech_engine::GoogleSpeechEngine;
use super::local_whisper_engine::LocalWhisperEngine;
use super::openai_whisper_engine::OpenAiWhisperEngine;
use super::os_native_engine::OsNativeEngine;
use super::scripted_speech_engine::ScriptedSpeechEngine;

pub struct SpeechEngineFactory;

impl SpeechEngineFactory {
    /// Construction never fails; missing credentials surface later through
    /// `status` and `initialize`.
    pub fn create(id: EngineId, settings: &EnginesSettings) -> Arc<dyn SpeechEngine> {
        match id {
            EngineId::Local => Arc::new(LocalWhisperEngine::new(settings.local.model_dir.clone())),
            EngineId::Azure => {
                let azure = &settings.azure;
                Arc::new(AzureSpeechEngine::new(
                    azure.endpoint.clone(),
                    &azure.deployment,
                    azure.api_key.clone(),
                    &azure.api_version,
                ))
            }
            EngineId::OpenAi => {
                let openai = &settings.openai;
                Arc::new(OpenAiWhisperEngine::new(
                    openai.api_key.clone(),
                    Some(openai.base_url.clone()),
                    Some(openai.model.clone()),
                ))
            }
            EngineId::Google => {
                let google = &settings.google;
                Arc::new(GoogleSpeechEngine::new(
                    google.api_key.clone(),
                    Some(google.base_url.clone()),
                    &google.default_language,
                ))
            }
            EngineId::OsNative => {
                let native = &settings.os_native;
                Arc::new(OsNativeEngine::new(native.command.clone(), native.args.clone()))
            }
        }
    }

    /// One engine per entry of the declared priority, duplicates dropped.
    pub fn create_all(
        selector: &SelectorSettings,
        settings: &EnginesSettings,
    ) -> Vec<Arc<dyn SpeechEngine>> {
        let mut seen = Vec::with_capacity(selector.priority.len());
        let mut engines: Vec<Arc<dyn SpeechEngine>> = Vec::with_capacity(selector.priority.len());

        for &id in &selector.priority {
            if seen.contains(&id) {
                tracing::warn!(engine = %id, "Engine listed twice in priority, ignoring repeat");
                continue;
            }
            seen.push(id);

            if selector.scaffold {
                engines.push(Arc::new(ScriptedSpeechEngine::new(id)));
            } else {
                engines.push(Self::create(id, settings));
            }
        }

        tracing::info!(
            priority = ?seen.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            scaffold = selector.scaffold,
            "Speech engines registered"
        );

        engines
    }
}
