use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a speech-to-text backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineId {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "os-native")]
    OsNative,
}

impl EngineId {
    /// Every engine, in the default declared priority order.
    pub const ALL: [EngineId; 5] = [
        EngineId::Local,
        EngineId::Azure,
        EngineId::OpenAi,
        EngineId::Google,
        EngineId::OsNative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::Local => "local",
            EngineId::Azure => "azure",
            EngineId::OpenAi => "openai",
            EngineId::Google => "google",
            EngineId::OsNative => "os-native",
        }
    }
}

impl FromStr for EngineId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(EngineId::Local),
            "azure" => Ok(EngineId::Azure),
            "openai" => Ok(EngineId::OpenAi),
            "google" => Ok(EngineId::Google),
            "os-native" | "os_native" => Ok(EngineId::OsNative),
            other => Err(format!(
                "Unknown engine: {}. Expected: local, azure, openai, google, or os-native",
                other
            )),
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
