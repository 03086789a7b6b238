use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::assistant::{GeminiGateway, GenerationConfig, DEFAULT_BASE_URL, DEFAULT_DESCRIPTION_LIMIT, DEFAULT_MODEL};
use crate::identity::{IdentifierResolver, PlatformPattern};
use crate::storage::DEFAULT_HISTORY_PREFIX;

const APP_DIR: &str = "leetassist";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub model: String,
    pub generation: GenerationConfig,
    /// Characters of problem description included in each prompt.
    pub description_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation: GenerationConfig::default(),
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
    pub snapshot_interval_secs: u64,
    pub edit_debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            snapshot_interval_secs: 30,
            edit_debounce_ms: 1000,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }

    pub fn edit_debounce(&self) -> Duration {
        Duration::from_millis(self.edit_debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history_prefix: String,
    pub api: ApiConfig,
    pub watch: WatchConfig,
    /// Tried in order before the title/URL fallback.
    pub platforms: Vec<PlatformPattern>,
    #[serde(skip, default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_prefix: DEFAULT_HISTORY_PREFIX.to_string(),
            api: ApiConfig::default(),
            watch: WatchConfig::default(),
            platforms: PlatformPattern::builtin(),
            data_dir: default_data_dir(),
            config_dir: default_config_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("LEETASSIST_CONFIG") {
            PathBuf::from(config_path)
        } else {
            default_config_dir().join("config.yaml")
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_config_dir(mut self, config_dir: PathBuf) -> Self {
        self.config_dir = config_dir;
        self
    }

    /// Conversation records and the current-code snapshot.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.config_dir.join("secrets.json")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn resolver(&self) -> Result<IdentifierResolver> {
        IdentifierResolver::from_patterns(&self.platforms).context("Invalid platform pattern in config")
    }

    pub fn gateway(&self) -> GeminiGateway {
        GeminiGateway::new()
            .with_base_url(self.api.base_url.clone())
            .with_model(self.api.model.clone())
            .with_generation(self.api.generation.clone())
            .with_description_limit(self.api.description_limit)
    }
}
