use serde::Serialize;

use super::EngineId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineCapabilities {
    pub interim_results: bool,
    pub speaker_diarization: bool,
    pub word_timing: bool,
    pub multi_language: bool,
}

/// Static metadata describing one engine. Built once per adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineDescriptor {
    pub id: EngineId,
    pub name: String,
    pub requires_network: bool,
    pub capabilities: EngineCapabilities,
}

impl EngineDescriptor {
    pub fn new(
        id: EngineId,
        name: impl Into<String>,
        requires_network: bool,
        capabilities: EngineCapabilities,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            requires_network,
            capabilities,
        }
    }
}
