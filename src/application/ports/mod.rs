mod speech_engine;

pub use speech_engine::{SpeechEngine, SpeechEngineError, Transcript};
