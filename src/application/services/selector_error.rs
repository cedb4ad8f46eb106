use std::fmt;

use crate::application::ports::SpeechEngineError;
use crate::domain::EngineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFailureKind {
    /// The engine's status query reported it unavailable.
    Unavailable,
    /// Credentials or model files are missing.
    Misconfigured,
    /// The engine could not be reached; worth retrying.
    Unreachable,
    Failed,
    TimedOut,
    Panicked,
}

/// Why one engine could not be made current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitFailure {
    pub engine: EngineId,
    pub kind: InitFailureKind,
    pub reason: String,
}

impl InitFailure {
    pub fn new(engine: EngineId, kind: InitFailureKind, reason: impl Into<String>) -> Self {
        Self {
            engine,
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn from_engine_error(engine: EngineId, error: &SpeechEngineError) -> Self {
        let kind = match error {
            SpeechEngineError::Unreachable(_) => InitFailureKind::Unreachable,
            e if e.is_configuration_error() => InitFailureKind::Misconfigured,
            _ => InitFailureKind::Failed,
        };
        Self::new(engine, kind, error.to_string())
    }
}

impl fmt::Display for InitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.engine, self.reason)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SelectorError {
    #[error("engine selector is not initialized")]
    NotInitialized,
    #[error("no speech engine available ({})", join_failures(.0))]
    NoEngineAvailable(Vec<InitFailure>),
    #[error("unknown engine: {0}")]
    UnknownEngine(EngineId),
    #[error("engine {} unavailable: {}", .0.engine, .0.reason)]
    EngineUnavailable(InitFailure),
    #[error("engine {engine} did not respond in time")]
    Timeout { engine: EngineId },
    #[error("engine {0} is registered more than once")]
    DuplicateEngine(EngineId),
}

impl SelectorError {
    /// True when every underlying failure needs configuration (credentials,
    /// model files) rather than a retry.
    pub fn is_configuration_error(&self) -> bool {
        let misconfigured = |f: &InitFailure| {
            matches!(
                f.kind,
                InitFailureKind::Misconfigured | InitFailureKind::Unavailable
            )
        };
        match self {
            SelectorError::NoEngineAvailable(failures) => {
                !failures.is_empty() && failures.iter().all(misconfigured)
            }
            SelectorError::EngineUnavailable(failure) => misconfigured(failure),
            SelectorError::UnknownEngine(_) | SelectorError::DuplicateEngine(_) => true,
            SelectorError::NotInitialized | SelectorError::Timeout { .. } => false,
        }
    }
}

fn join_failures(failures: &[InitFailure]) -> String {
    if failures.is_empty() {
        return "no engines registered".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
