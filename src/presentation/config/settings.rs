use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use crate::domain::EngineId;

use super::Environment;

const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub selector: SelectorSettings,
    pub logging: LoggingSettings,
    pub engines: EnginesSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),
    #[error("configuration load failed: {0}")]
    Load(#[from] config::ConfigError),
}

impl Settings {
    /// Layers `appsettings.toml`, `appsettings.{environment}.toml` and
    /// `APP_*` environment variables, later sources winning.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(SettingsError::InvalidEnvironment)?;

        Self::load_from(Path::new("."), environment)
    }

    pub fn load_from(dir: &Path, environment: Environment) -> Result<Self, SettingsError> {
        let base = dir.join("appsettings.toml");
        let layered = dir.join(format!(
            "appsettings.{}.toml",
            environment.as_str()
        ));

        let configuration = Config::builder()
            .add_source(File::from(base).required(false))
            .add_source(File::from(layered).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("selector.priority")
                    .try_parsing(true),
            )
            .build()?;

        Ok(configuration.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
    /// Declared fallback order. Engines missing from the list are not registered.
    pub priority: Vec<EngineId>,
    pub preferred: Option<EngineId>,
    pub timeout_secs: u64,
    /// Replace every engine with an in-process scripted one.
    pub scaffold: bool,
}

impl SelectorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            priority: EngineId::ALL.to_vec(),
            preferred: None,
            timeout_secs: 30,
            scaffold: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnginesSettings {
    pub local: LocalEngineSettings,
    pub azure: AzureEngineSettings,
    pub openai: OpenAiEngineSettings,
    pub google: GoogleEngineSettings,
    pub os_native: OsNativeEngineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalEngineSettings {
    pub model_dir: PathBuf,
}

impl Default for LocalEngineSettings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/whisper-base"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AzureEngineSettings {
    pub endpoint: Option<String>,
    pub deployment: String,
    pub api_key: Option<String>,
    pub api_version: String,
}

impl Default for AzureEngineSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: "whisper".to_string(),
            api_key: None,
            api_version: "2024-06-01".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiEngineSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for OpenAiEngineSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleEngineSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_language: String,
}

impl Default for GoogleEngineSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://speech.googleapis.com/v1".to_string(),
            default_language: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsNativeEngineSettings {
    /// Executable name or path; resolved on `PATH`.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for OsNativeEngineSettings {
    fn default() -> Self {
        Self {
            command: "speechgate-native".to_string(),
            args: Vec::new(),
        }
    }
}
