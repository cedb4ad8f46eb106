use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;

use crate::application::ports::{SpeechEngine, SpeechEngineError, Transcript};
use crate::domain::{EngineDescriptor, EngineId, EngineStatus, TranscriptionRequest};

use super::audio_decoder::decode_to_mono_16k;
use super::catalog;
use super::language::primary_subtag;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const MEL_FILTERS_FILE: &str = "melfilters.bytes";

const REQUIRED_FILES: [&str; 4] = [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE, MEL_FILTERS_FILE];
const MAX_DECODE_TOKENS: usize = 224;

/// Offline Whisper running on candle, loaded from a local model directory.
pub struct LocalWhisperEngine {
    descriptor: EngineDescriptor,
    model_dir: PathBuf,
    loaded: OnceCell<Arc<LoadedWhisper>>,
}

struct LoadedWhisper {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    mel_filters: Vec<f32>,
    device: Device,
}

impl LocalWhisperEngine {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            descriptor: catalog::descriptor(EngineId::Local),
            model_dir: model_dir.into(),
            loaded: OnceCell::new(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Required model files absent from the model directory.
    pub fn missing_files(&self) -> Vec<&'static str> {
        REQUIRED_FILES
            .into_iter()
            .filter(|f| !self.model_dir.join(f).is_file())
            .collect()
    }

    fn model_name(&self) -> Option<String> {
        self.model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl SpeechEngine for LocalWhisperEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> Result<(), SpeechEngineError> {
        self.loaded
            .get_or_try_init(|| async {
                let dir = self.model_dir.clone();
                tracing::info!(model_dir = %dir.display(), "Loading local Whisper model");
                let loaded = tokio::task::spawn_blocking(move || LoadedWhisper::load(&dir))
                    .await
                    .map_err(|e| SpeechEngineError::ModelLoadFailed(format!("loader task: {}", e)))??;
                tracing::info!("Local Whisper model loaded");
                Ok::<_, SpeechEngineError>(Arc::new(loaded))
            })
            .await?;
        Ok(())
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Transcript, SpeechEngineError> {
        let loaded = self
            .loaded
            .get()
            .map(Arc::clone)
            .ok_or(SpeechEngineError::NotInitialized)?;
        let audio = request.audio.clone();
        let language = request.language.clone();

        // Inference is CPU bound; a cancelled caller stops waiting but the
        // current segment still runs to completion.
        tokio::task::spawn_blocking(move || {
            let pcm = decode_to_mono_16k(&audio)?;
            loaded.transcribe_pcm(&pcm, language.as_deref())
        })
        .await
        .map_err(|e| SpeechEngineError::TranscriptionFailed(format!("inference task: {}", e)))?
    }

    async fn status(&self) -> Result<EngineStatus, SpeechEngineError> {
        let id = self.descriptor.id;
        let missing = self.missing_files();
        if !missing.is_empty() {
            return Ok(EngineStatus::unavailable(
                id,
                format!(
                    "model files missing in {}: {}",
                    self.model_dir.display(),
                    missing.join(", ")
                ),
            ));
        }

        let message = if self.is_initialized() {
            "model loaded"
        } else {
            "model files present"
        };
        Ok(EngineStatus::available(id, self.model_name(), message))
    }

    fn is_initialized(&self) -> bool {
        self.loaded.initialized()
    }
}

impl LoadedWhisper {
    fn load(dir: &Path) -> Result<Self, SpeechEngineError> {
        let device = Device::Cpu;

        let config_contents = std::fs::read_to_string(dir.join(CONFIG_FILE))
            .map_err(|e| load_failed(format!("read {}: {}", CONFIG_FILE, e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| load_failed(format!("parse {}: {}", CONFIG_FILE, e)))?;

        let tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE))
            .map_err(|e| load_failed(format!("{}: {}", TOKENIZER_FILE, e)))?;

        let mel_bytes = std::fs::read(dir.join(MEL_FILTERS_FILE))
            .map_err(|e| load_failed(format!("{}: {}", MEL_FILTERS_FILE, e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, config.num_mel_bins)?;

        // SAFETY: the weights file is memory-mapped read-only.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[dir.join(WEIGHTS_FILE)], m::DTYPE, &device)
                .map_err(|e| load_failed(format!("{}: {}", WEIGHTS_FILE, e)))?
        };
        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| load_failed(format!("model: {}", e)))?;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            mel_filters,
            device,
        })
    }

    fn transcribe_pcm(
        &self,
        pcm: &[f32],
        language: Option<&str>,
    ) -> Result<Transcript, SpeechEngineError> {
        let prompt = self.prompt_tokens(language)?;
        let eot = self.token_id(m::EOT_TOKEN)?;

        let mut model = self.model.lock();
        let mut segments = Vec::new();
        let mut probabilities = Vec::new();

        for (i, chunk) in pcm.chunks(m::N_SAMPLES).enumerate() {
            let mut samples = chunk.to_vec();
            samples.resize(m::N_SAMPLES, 0.0);

            let mel = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel.len() / n_mel;
            let mel = Tensor::from_vec(mel, (1, n_mel, n_frames), &self.device)
                .map_err(|e| inference(format!("mel tensor: {}", e)))?;

            tracing::debug!(segment = i, "Decoding audio segment");
            let (tokens, probs) = decode_segment(&mut model, &self.device, &mel, &prompt, eot)
                .map_err(|e| inference(format!("segment {}: {}", i, e)))?;
            let text = self
                .tokenizer
                .decode(&tokens, true)
                .map_err(|e| inference(format!("detokenize: {}", e)))?;
            let text = text.trim();
            if !text.is_empty() {
                segments.push(text.to_string());
            }
            probabilities.extend(probs);
        }

        let confidence = (!probabilities.is_empty())
            .then(|| probabilities.iter().sum::<f32>() / probabilities.len() as f32);

        tracing::info!(segments = segments.len(), "Local Whisper transcription completed");

        Ok(Transcript {
            text: segments.join(" "),
            confidence,
            language: language.map(str::to_string),
        })
    }

    fn prompt_tokens(&self, language: Option<&str>) -> Result<Vec<u32>, SpeechEngineError> {
        let mut prompt = vec![self.token_id(m::SOT_TOKEN)?];
        if let Some(language) = language {
            let tag = format!("<|{}|>", primary_subtag(language).to_lowercase());
            match self.tokenizer.token_to_id(&tag) {
                Some(id) => prompt.push(id),
                None => tracing::debug!(language = %language, "Model has no token for language hint"),
            }
        }
        prompt.push(self.token_id(m::TRANSCRIBE_TOKEN)?);
        prompt.push(self.token_id(m::NO_TIMESTAMPS_TOKEN)?);
        Ok(prompt)
    }

    fn token_id(&self, token: &str) -> Result<u32, SpeechEngineError> {
        self.tokenizer
            .token_to_id(token)
            .ok_or_else(|| inference(format!("token not found: {}", token)))
    }
}

/// Greedy decoding of one 30 s window. Returns text tokens and the
/// probability the model assigned to each.
fn decode_segment(
    model: &mut m::model::Whisper,
    device: &Device,
    mel: &Tensor,
    prompt: &[u32],
    eot: u32,
) -> candle_core::Result<(Vec<u32>, Vec<f32>)> {
    let audio_features = model.encoder.forward(mel, true)?;

    let mut tokens = prompt.to_vec();
    let mut emitted = Vec::new();
    let mut probabilities = Vec::new();

    for step in 0..MAX_DECODE_TOKENS {
        let input = Tensor::new(tokens.as_slice(), device)?.unsqueeze(0)?;
        let hidden = model.decoder.forward(&input, &audio_features, step == 0)?;
        let logits = model.decoder.final_linear(&hidden.squeeze(0)?)?;
        let last = logits.get(logits.dim(0)? - 1)?;

        let next = last.argmax(0)?.to_scalar::<u32>()?;
        if next == eot {
            break;
        }
        let probability = candle_nn::ops::softmax(&last, 0)?
            .get(next as usize)?
            .to_scalar::<f32>()?;

        tokens.push(next);
        emitted.push(next);
        probabilities.push(probability);
    }

    model.reset_kv_cache();
    Ok((emitted, probabilities))
}

fn read_mel_filters(bytes: &[u8], num_mel_bins: usize) -> Result<Vec<f32>, SpeechEngineError> {
    let expected = num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected * 4 {
        return Err(load_failed(format!(
            "{} too small: {} bytes, expected at least {}",
            MEL_FILTERS_FILE,
            bytes.len(),
            expected * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn load_failed(msg: String) -> SpeechEngineError {
    SpeechEngineError::ModelLoadFailed(msg)
}

fn inference(msg: String) -> SpeechEngineError {
    SpeechEngineError::TranscriptionFailed(msg)
}
