use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{SpeechEngine, SpeechEngineError};
use crate::domain::{
    EngineDescriptor, EngineId, EngineStatus, FailureKind, TranscriptionRequest,
    TranscriptionResult, UNDETERMINED_LANGUAGE,
};

use super::selector_error::{InitFailure, InitFailureKind, SelectorError};

pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Confidence reported for successful transcripts when the engine gives none.
pub const DEFAULT_CONFIDENCE: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct SelectorOptions {
    /// Upper bound for every adapter call (status, initialize, transcribe).
    pub timeout: Duration,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorState {
    Uninitialized,
    Initializing,
    Ready(EngineId),
    Failed(Vec<InitFailure>),
}

struct Snapshot {
    state: SelectorState,
    current: Option<Arc<dyn SpeechEngine>>,
}

impl Snapshot {
    fn uninitialized() -> Self {
        Self {
            state: SelectorState::Uninitialized,
            current: None,
        }
    }
}

enum CallFailure {
    Engine(SpeechEngineError),
    TimedOut,
    Panicked(String),
}

impl CallFailure {
    fn into_init_failure(self, engine: EngineId) -> InitFailure {
        match self {
            CallFailure::Engine(e) => InitFailure::from_engine_error(engine, &e),
            CallFailure::TimedOut => {
                InitFailure::new(engine, InitFailureKind::TimedOut, "engine did not respond in time")
            }
            CallFailure::Panicked(msg) => InitFailure::new(
                engine,
                InitFailureKind::Panicked,
                format!("engine panicked: {}", msg),
            ),
        }
    }

    fn message(&self) -> String {
        match self {
            CallFailure::Engine(e) => e.to_string(),
            CallFailure::TimedOut => "engine did not respond in time".to_string(),
            CallFailure::Panicked(msg) => format!("engine panicked: {}", msg),
        }
    }
}

/// Presents one transcription contract over an ordered set of engines.
///
/// The current engine lives in an `Arc` snapshot that is replaced in a single
/// write, so a concurrent `transcribe` sees either the old engine or the new
/// one. `initialize` and `switch_engine` are serialized by a writer lock that
/// readers never take.
pub struct EngineSelector {
    engines: Vec<Arc<dyn SpeechEngine>>,
    options: SelectorOptions,
    snapshot: RwLock<Arc<Snapshot>>,
    transition: Mutex<()>,
}

impl EngineSelector {
    /// `engines` are given in declared priority order.
    pub fn new(
        engines: Vec<Arc<dyn SpeechEngine>>,
        options: SelectorOptions,
    ) -> Result<Self, SelectorError> {
        for (i, engine) in engines.iter().enumerate() {
            let id = engine.descriptor().id;
            if engines[..i].iter().any(|e| e.descriptor().id == id) {
                return Err(SelectorError::DuplicateEngine(id));
            }
        }

        Ok(Self {
            engines,
            options,
            snapshot: RwLock::new(Arc::new(Snapshot::uninitialized())),
            transition: Mutex::new(()),
        })
    }

    pub fn options(&self) -> SelectorOptions {
        self.options
    }

    pub fn priority(&self) -> Vec<EngineId> {
        self.engines.iter().map(|e| e.descriptor().id).collect()
    }

    pub fn descriptors(&self) -> Vec<EngineDescriptor> {
        self.engines.iter().map(|e| e.descriptor().clone()).collect()
    }

    pub fn state(&self) -> SelectorState {
        self.load().state.clone()
    }

    pub fn current_engine_id(&self) -> Option<EngineId> {
        self.load().current.as_ref().map(|e| e.descriptor().id)
    }

    pub fn current_descriptor(&self) -> Option<EngineDescriptor> {
        self.load().current.as_ref().map(|e| e.descriptor().clone())
    }

    pub fn is_listening(&self) -> bool {
        self.load()
            .current
            .as_ref()
            .is_some_and(|e| e.is_listening())
    }

    /// Selects the first engine, starting with `preferred`, that reports
    /// available and initializes successfully.
    pub async fn initialize(&self, preferred: Option<EngineId>) -> Result<EngineId, SelectorError> {
        if let Some(id) = preferred {
            self.find(id).ok_or(SelectorError::UnknownEngine(id))?;
        }

        let _writer = self.transition.lock().await;

        let previous = self.load();
        if previous.current.is_none() {
            self.publish(Snapshot {
                state: SelectorState::Initializing,
                current: None,
            });
        }

        let mut failures = Vec::new();
        for engine in self.candidates(preferred) {
            let id = engine.descriptor().id;
            match self.activate(engine).await {
                Ok(()) => {
                    self.publish(Snapshot {
                        state: SelectorState::Ready(id),
                        current: Some(Arc::clone(engine)),
                    });
                    tracing::info!(
                        engine = %id,
                        preferred = ?preferred.map(|p| p.as_str()),
                        skipped = failures.len(),
                        "Speech engine selected"
                    );
                    return Ok(id);
                }
                Err(failure) => {
                    tracing::warn!(
                        engine = %id,
                        kind = ?failure.kind,
                        reason = %failure.reason,
                        "Speech engine unavailable, trying next"
                    );
                    failures.push(failure);
                }
            }
        }

        tracing::error!(attempted = failures.len(), "No speech engine could be initialized");
        self.publish(Snapshot {
            state: SelectorState::Failed(failures.clone()),
            current: None,
        });
        Err(SelectorError::NoEngineAvailable(failures))
    }

    /// Makes `id` current. On failure the previous engine stays current.
    pub async fn switch_engine(&self, id: EngineId) -> Result<(), SelectorError> {
        let engine = self.find(id).ok_or(SelectorError::UnknownEngine(id))?;

        let _writer = self.transition.lock().await;

        if self.current_engine_id() == Some(id) {
            return Ok(());
        }

        match self.activate(engine).await {
            Ok(()) => {
                let from = self.current_engine_id();
                self.publish(Snapshot {
                    state: SelectorState::Ready(id),
                    current: Some(Arc::clone(engine)),
                });
                tracing::info!(
                    from = ?from.map(|e| e.as_str()),
                    to = %id,
                    "Switched speech engine"
                );
                Ok(())
            }
            Err(failure) => {
                tracing::warn!(
                    engine = %id,
                    kind = ?failure.kind,
                    reason = %failure.reason,
                    "Speech engine switch rejected"
                );
                if failure.kind == InitFailureKind::TimedOut {
                    Err(SelectorError::Timeout { engine: id })
                } else {
                    Err(SelectorError::EngineUnavailable(failure))
                }
            }
        }
    }

    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResult, SelectorError> {
        self.transcribe_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Only state errors are returned as `Err`; every engine-level failure,
    /// including timeout and cancellation, comes back as a failed result.
    pub async fn transcribe_with_cancellation(
        &self,
        request: TranscriptionRequest,
        cancel: CancellationToken,
    ) -> Result<TranscriptionResult, SelectorError> {
        let engine = self
            .load()
            .current
            .as_ref()
            .map(Arc::clone)
            .ok_or(SelectorError::NotInitialized)?;
        let id = engine.descriptor().id;
        let language = request
            .language
            .clone()
            .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string());
        let started = Instant::now();

        if request.audio.is_empty() {
            return Ok(TranscriptionResult::failure(
                id,
                FailureKind::InvalidRequest,
                "audio payload is empty",
                language,
                started.elapsed(),
            ));
        }

        let span = tracing::info_span!("transcribe", engine = %id, bytes = request.audio.len());
        let outcome = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = bounded(self.options.timeout, engine.transcribe(&request)) => Some(outcome),
            }
        }
        .instrument(span)
        .await;

        let elapsed = started.elapsed();
        let result = match outcome {
            None => {
                tracing::info!(engine = %id, "Transcription cancelled");
                TranscriptionResult::failure(
                    id,
                    FailureKind::Cancelled,
                    "transcription cancelled by caller",
                    language,
                    elapsed,
                )
            }
            Some(Ok(transcript)) => TranscriptionResult::success(
                id,
                transcript.text,
                transcript.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                transcript.language.unwrap_or(language),
                elapsed,
            ),
            Some(Err(failure)) => {
                let kind = match failure {
                    CallFailure::TimedOut => FailureKind::Timeout,
                    _ => FailureKind::TranscriptionFailed,
                };
                let message = failure.message();
                tracing::warn!(engine = %id, kind = %kind, error = %message, "Transcription failed");
                TranscriptionResult::failure(id, kind, message, language, elapsed)
            }
        };

        tracing::debug!(
            engine = %id,
            success = result.is_success(),
            words = result.word_count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Transcription finished"
        );

        Ok(result)
    }

    /// One entry per registered engine, in priority order. Queries run
    /// concurrently and a failing query yields an unavailable entry.
    pub async fn get_all_engine_status(&self) -> Vec<EngineStatus> {
        let timeout = self.options.timeout;
        let queries = self.engines.iter().map(|engine| async move {
            let id = engine.descriptor().id;
            match bounded(timeout, engine.status()).await {
                Ok(mut status) => {
                    status.engine = id;
                    status
                }
                Err(failure) => {
                    let message = failure.message();
                    tracing::debug!(engine = %id, error = %message, "Engine status query failed");
                    EngineStatus::unavailable(id, message)
                }
            }
        });
        join_all(queries).await
    }

    fn load(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }

    fn find(&self, id: EngineId) -> Option<&Arc<dyn SpeechEngine>> {
        self.engines.iter().find(|e| e.descriptor().id == id)
    }

    fn candidates(&self, preferred: Option<EngineId>) -> Vec<&Arc<dyn SpeechEngine>> {
        let mut ordered: Vec<&Arc<dyn SpeechEngine>> = Vec::with_capacity(self.engines.len());
        if let Some(engine) = preferred.and_then(|id| self.find(id)) {
            ordered.push(engine);
        }
        ordered.extend(
            self.engines
                .iter()
                .filter(|e| Some(e.descriptor().id) != preferred),
        );
        ordered
    }

    /// Availability check followed by initialization when needed.
    async fn activate(&self, engine: &Arc<dyn SpeechEngine>) -> Result<(), InitFailure> {
        let id = engine.descriptor().id;

        let status = bounded(self.options.timeout, engine.status())
            .await
            .map_err(|f| f.into_init_failure(id))?;
        if !status.is_available {
            return Err(InitFailure::new(
                id,
                InitFailureKind::Unavailable,
                status.message,
            ));
        }

        if !engine.is_initialized() {
            bounded(self.options.timeout, engine.initialize())
                .await
                .map_err(|f| f.into_init_failure(id))?;
        }

        Ok(())
    }
}

async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, CallFailure>
where
    F: Future<Output = Result<T, SpeechEngineError>>,
{
    match tokio::time::timeout(timeout, AssertUnwindSafe(call).catch_unwind()).await {
        Err(_) => Err(CallFailure::TimedOut),
        Ok(Err(payload)) => Err(CallFailure::Panicked(panic_message(payload.as_ref()))),
        Ok(Ok(Err(e))) => Err(CallFailure::Engine(e)),
        Ok(Ok(Ok(value))) => Ok(value),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
