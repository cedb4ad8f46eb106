use serde::Deserialize;

use crate::application::ports::Transcript;

use super::language::whisper_language_code;

/// `verbose_json` body shared by the OpenAI and Azure OpenAI Whisper APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct VerboseTranscription {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Segment {
    pub avg_logprob: f32,
}

impl VerboseTranscription {
    /// Mean per-segment token probability, when segments are reported.
    pub fn confidence(&self) -> Option<f32> {
        if self.segments.is_empty() {
            return None;
        }
        let total: f32 = self.segments.iter().map(|s| s.avg_logprob.exp()).sum();
        Some(total / self.segments.len() as f32)
    }

    /// The caller's hint wins over the language Whisper detected. Detected
    /// names without a known code are dropped.
    pub fn into_transcript(self, hint: Option<&str>) -> Transcript {
        let confidence = self.confidence();
        let language = hint.map(str::to_string).or_else(|| {
            self.language
                .as_deref()
                .and_then(whisper_language_code)
                .map(str::to_string)
        });
        Transcript {
            text: self.text.trim().to_string(),
            confidence,
            language,
        }
    }
}
