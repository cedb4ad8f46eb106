use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::application::ports::{SpeechEngine, SpeechEngineError, Transcript};
use crate::domain::{EngineDescriptor, EngineId, EngineStatus, TranscriptionRequest};

use super::catalog;

/// Environment variable carrying the language hint to the recognizer process.
pub const LANGUAGE_ENV: &str = "SPEECHGATE_LANGUAGE";

/// Bridges to the platform recognizer through a helper executable that reads
/// audio on stdin and writes the transcript to stdout.
pub struct OsNativeEngine {
    descriptor: EngineDescriptor,
    command: String,
    args: Vec<String>,
    resolved: OnceLock<PathBuf>,
}

impl OsNativeEngine {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            descriptor: catalog::descriptor(EngineId::OsNative),
            command: command.into(),
            args,
            resolved: OnceLock::new(),
        }
    }

    fn resolve(&self) -> Result<PathBuf, SpeechEngineError> {
        which::which(&self.command).map_err(|e| {
            SpeechEngineError::ModelLoadFailed(format!(
                "recognizer `{}` not found: {}",
                self.command, e
            ))
        })
    }
}

#[async_trait]
impl SpeechEngine for OsNativeEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> Result<(), SpeechEngineError> {
        if self.resolved.get().is_some() {
            return Ok(());
        }
        let path = self.resolve()?;
        tracing::info!(path = %path.display(), "OS-native recognizer ready");
        let _ = self.resolved.set(path);
        Ok(())
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Transcript, SpeechEngineError> {
        let path = self.resolved.get().ok_or(SpeechEngineError::NotInitialized)?;

        let mut command = Command::new(path);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(language) = request.language.as_deref() {
            command.env(LANGUAGE_ENV, language);
        }

        let mut child = command.spawn().map_err(|e| {
            SpeechEngineError::TranscriptionFailed(format!("spawn {}: {}", path.display(), e))
        })?;

        // Feed stdin while collecting output; the helper may exit before
        // reading all of it and its stderr must still be reported.
        let stdin = child.stdin.take();
        let feed = async move {
            match stdin {
                Some(mut stdin) => stdin.write_all(&request.audio).await,
                None => Ok(()),
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output =
            output.map_err(|e| SpeechEngineError::TranscriptionFailed(format!("wait: {}", e)))?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(SpeechEngineError::TranscriptionFailed(format!(
                "recognizer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if let Err(e) = fed {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(SpeechEngineError::TranscriptionFailed(format!(
                    "stdin: {}: {}",
                    e,
                    stderr.trim()
                )));
            }
            tracing::debug!("Recognizer exited before reading all audio");
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::info!(chars = text.len(), "OS-native transcription completed");

        let mut transcript = Transcript::new(text);
        transcript.language = request.language.clone();
        Ok(transcript)
    }

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError> {
        let id = self.descriptor.id;
        Ok(match self.resolve() {
            Ok(path) => EngineStatus::available(id, None, format!("recognizer at {}", path.display())),
            Err(e) => EngineStatus::unavailable(id, e.to_string()),
        })
    }

    fn is_initialized(&self) -> bool {
        self.resolved.get().is_some()
    }
}
