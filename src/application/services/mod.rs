mod engine_selector;
mod selector_error;

pub use engine_selector::{
    DEFAULT_CONFIDENCE, DEFAULT_ENGINE_TIMEOUT, EngineSelector, SelectorOptions, SelectorState,
};
pub use selector_error::{InitFailure, InitFailureKind, SelectorError};
