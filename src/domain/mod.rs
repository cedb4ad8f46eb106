mod engine_descriptor;
mod engine_id;
mod engine_status;
mod transcription_request;
mod transcription_result;

pub use engine_descriptor::{EngineCapabilities, EngineDescriptor};
pub use engine_id::EngineId;
pub use engine_status::EngineStatus;
pub use transcription_request::TranscriptionRequest;
pub use transcription_result::{FailureKind, TranscriptionResult, UNDETERMINED_LANGUAGE};
