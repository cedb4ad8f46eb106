use chrono::{DateTime, Utc};
use serde::Serialize;

use super::EngineId;

/// Point-in-time availability of one engine. Recomputed on every query.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub engine: EngineId,
    pub is_available: bool,
    pub version: Option<String>,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

impl EngineStatus {
    pub fn available(engine: EngineId, version: Option<String>, message: impl Into<String>) -> Self {
        Self {
            engine,
            is_available: true,
            version,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }

    pub fn unavailable(engine: EngineId, message: impl Into<String>) -> Self {
        Self {
            engine,
            is_available: false,
            version: None,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }
}
