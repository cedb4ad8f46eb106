pub mod audio_decoder;
mod azure_speech_engine;
pub mod catalog;
mod google_speech_engine;
mod http_support;
mod language;
mod local_whisper_engine;
mod openai_whisper_engine;
mod os_native_engine;
mod scripted_speech_engine;
mod speech_engine_factory;
mod whisper_response;

pub use azure_speech_engine::AzureSpeechEngine;
pub use google_speech_engine::GoogleSpeechEngine;
pub use local_whisper_engine::LocalWhisperEngine;
pub use openai_whisper_engine::OpenAiWhisperEngine;
pub use os_native_engine::{LANGUAGE_ENV, OsNativeEngine};
pub use scripted_speech_engine::ScriptedSpeechEngine;
pub use speech_engine_factory::SpeechEngineFactory;
