use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::types::{CapabilityKind, ModelSpec};
use crate::Result;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "brief";

/// Upper bound on page fetches regardless of configuration.
pub const MAX_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub backend: BackendConfig,
    pub models: ModelsConfig,
    pub reclaim: ReclaimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// What the extractor does when a page has no usable paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTextPolicy {
    /// Fail the request with `NoContent`.
    #[default]
    Reject,
    /// Summarize a fixed placeholder sentence instead.
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub empty_text: EmptyTextPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: MAX_FETCH_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            empty_text: EmptyTextPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Configured timeout clamped to `1s..=10s`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1)).min(MAX_FETCH_TIMEOUT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ollama,
    Dummy,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "dummy" => Ok(BackendKind::Dummy),
            other => Err(format!("Unknown backend: {}. Available backends: ollama, dummy", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub base_url: String,
    /// Per-call timeout for model calls; slow inference is otherwise unbounded.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 300,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Verify and warm every model at startup.
    #[default]
    Eager,
    /// Verify at startup, load on first use.
    Lazy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub load: LoadMode,
    pub summarize: ModelSpec,
    pub generate: ModelSpec,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            load: LoadMode::default(),
            summarize: ModelSpec::new("llama3.2:3b"),
            generate: ModelSpec::new("llama3.2:1b"),
        }
    }
}

impl ModelsConfig {
    pub fn spec(&self, kind: CapabilityKind) -> &ModelSpec {
        match kind {
            CapabilityKind::Summarize => &self.summarize,
            CapabilityKind::Generate => &self.generate,
        }
    }
}

/// When model-runtime memory is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimPolicy {
    Off,
    #[default]
    AfterInference,
    AfterEveryResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    pub policy: ReclaimPolicy,
}

impl AppConfig {
    /// Defaults, then the TOML file, then `BRIEF_<SECTION>__<KEY>` variables.
    ///
    /// An explicit `path` must exist; the implicit `brief.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("BRIEF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
