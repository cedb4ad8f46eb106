use crate::domain::{EngineCapabilities, EngineDescriptor, EngineId};

/// Built-in metadata for every engine identifier.
pub fn descriptor(id: EngineId) -> EngineDescriptor {
    match id {
        EngineId::Local => EngineDescriptor::new(
            id,
            "Local Whisper",
            false,
            EngineCapabilities {
                multi_language: true,
                ..Default::default()
            },
        ),
        EngineId::Azure => EngineDescriptor::new(
            id,
            "Azure OpenAI Whisper",
            true,
            EngineCapabilities {
                word_timing: true,
                multi_language: true,
                ..Default::default()
            },
        ),
        EngineId::OpenAi => EngineDescriptor::new(
            id,
            "OpenAI Whisper",
            true,
            EngineCapabilities {
                word_timing: true,
                multi_language: true,
                ..Default::default()
            },
        ),
        EngineId::Google => EngineDescriptor::new(
            id,
            "Google Cloud Speech-to-Text",
            true,
            EngineCapabilities {
                interim_results: true,
                speaker_diarization: true,
                word_timing: true,
                multi_language: true,
            },
        ),
        EngineId::OsNative => EngineDescriptor::new(
            id,
            "Operating system recognizer",
            false,
            EngineCapabilities {
                interim_results: true,
                ..Default::default()
            },
        ),
    }
}
