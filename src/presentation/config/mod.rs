mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AzureEngineSettings, EnginesSettings, GoogleEngineSettings, LocalEngineSettings,
    LoggingSettings, OpenAiEngineSettings, OsNativeEngineSettings, SelectorSettings, Settings,
    SettingsError,
};
