use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{SpeechEngine, SpeechEngineError, Transcript};
use crate::domain::{EngineDescriptor, EngineId, EngineStatus, TranscriptionRequest};

use super::catalog;

#[derive(Debug, Clone)]
enum Reply {
    Transcript(Transcript),
    Error(SpeechEngineError),
    Panic(String),
}

#[derive(Debug, Clone)]
enum StatusReply {
    Report,
    Error(SpeechEngineError),
    Panic(String),
}

/// In-process engine whose every answer is configured up front.
/// Backs scaffold mode and selector tests.
pub struct ScriptedSpeechEngine {
    descriptor: EngineDescriptor,
    available: AtomicBool,
    unavailable_reason: String,
    init_error: Mutex<Option<SpeechEngineError>>,
    init_panic: Option<String>,
    reply: Reply,
    status_reply: StatusReply,
    status_delay: Duration,
    initialize_delay: Duration,
    transcribe_delay: Duration,
    listening: bool,
    initialized: AtomicBool,
    initialize_calls: AtomicUsize,
    transcribe_calls: AtomicUsize,
}

impl ScriptedSpeechEngine {
    pub fn new(id: EngineId) -> Self {
        Self {
            descriptor: catalog::descriptor(id),
            available: AtomicBool::new(true),
            unavailable_reason: format!("{} is not configured", id),
            init_error: Mutex::new(None),
            init_panic: None,
            reply: Reply::Transcript(
                Transcript::new(format!("scripted transcript from {}", id)).with_confidence(0.9),
            ),
            status_reply: StatusReply::Report,
            status_delay: Duration::ZERO,
            initialize_delay: Duration::ZERO,
            transcribe_delay: Duration::ZERO,
            listening: false,
            initialized: AtomicBool::new(false),
            initialize_calls: AtomicUsize::new(0),
            transcribe_calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(self, reason: impl Into<String>) -> Self {
        self.available.store(false, Ordering::SeqCst);
        Self {
            unavailable_reason: reason.into(),
            ..self
        }
    }

    pub fn failing_initialize(self, error: SpeechEngineError) -> Self {
        *self.init_error.lock() = Some(error);
        self
    }

    pub fn panicking_initialize(self, message: impl Into<String>) -> Self {
        Self {
            init_panic: Some(message.into()),
            ..self
        }
    }

    pub fn replying(self, transcript: Transcript) -> Self {
        Self {
            reply: Reply::Transcript(transcript),
            ..self
        }
    }

    pub fn failing_transcribe(self, error: SpeechEngineError) -> Self {
        Self {
            reply: Reply::Error(error),
            ..self
        }
    }

    pub fn panicking_transcribe(self, message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Panic(message.into()),
            ..self
        }
    }

    pub fn failing_status(self, error: SpeechEngineError) -> Self {
        Self {
            status_reply: StatusReply::Error(error),
            ..self
        }
    }

    pub fn panicking_status(self, message: impl Into<String>) -> Self {
        Self {
            status_reply: StatusReply::Panic(message.into()),
            ..self
        }
    }

    pub fn with_status_delay(self, status_delay: Duration) -> Self {
        Self {
            status_delay,
            ..self
        }
    }

    pub fn with_initialize_delay(self, initialize_delay: Duration) -> Self {
        Self {
            initialize_delay,
            ..self
        }
    }

    pub fn with_transcribe_delay(self, transcribe_delay: Duration) -> Self {
        Self {
            transcribe_delay,
            ..self
        }
    }

    pub fn listening(self) -> Self {
        Self {
            listening: true,
            ..self
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn clear_initialize_failure(&self) {
        *self.init_error.lock() = None;
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn transcribe_calls(&self) -> usize {
        self.transcribe_calls.load(Ordering::SeqCst)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl SpeechEngine for ScriptedSpeechEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> Result<(), SpeechEngineError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.initialize_delay).await;
        if let Some(message) = &self.init_panic {
            panic!("{}", message);
        }

        let init_error = self.init_error.lock().clone();
        if let Some(error) = init_error {
            return Err(error);
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(SpeechEngineError::MissingCredentials(
                self.unavailable_reason.clone(),
            ));
        }

        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Transcript, SpeechEngineError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(SpeechEngineError::NotInitialized);
        }
        pause(self.transcribe_delay).await;

        match &self.reply {
            Reply::Transcript(transcript) => {
                let mut transcript = transcript.clone();
                if transcript.language.is_none() {
                    transcript.language = request.language.clone();
                }
                Ok(transcript)
            }
            Reply::Error(error) => Err(error.clone()),
            Reply::Panic(message) => panic!("{}", message),
        }
    }

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError> {
        pause(self.status_delay).await;

        match &self.status_reply {
            StatusReply::Report => {}
            StatusReply::Error(error) => return Err(error.clone()),
            StatusReply::Panic(message) => panic!("{}", message),
        }

        if self.available.load(Ordering::SeqCst) {
            Ok(EngineStatus::available(
                self.descriptor.id,
                Some("scripted".to_string()),
                "ready",
            ))
        } else {
            Ok(EngineStatus::unavailable(
                self.descriptor.id,
                self.unavailable_reason.clone(),
            ))
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn is_listening(&self) -> bool {
        self.listening && self.is_initialized()
    }
}
