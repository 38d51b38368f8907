//! Configuration - defaults, then `smolagent.toml`, then flags and environment

use serde::Deserialize;
use smolagent_agent::AgentConfig;
use smolagent_error::{Error, ErrorKind, Result};
use smolagent_llm::{ProviderConfig, OPENROUTER_BASE_URL, OPENROUTER_DEFAULT_MODEL};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const CONFIG_FILE: &str = "smolagent.toml";

pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of a config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub provider: ProviderSection,
    pub agent: AgentSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSection {
    pub max_iterations: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl FileConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            Error::config_invalid(format!("invalid config: {}", e.message()))
                .with_operation("config::parse")
                .set_source(e)
        })
    }

    /// Read `path`, or `smolagent.toml` in the working directory if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        tracing::debug!(path = %path.display(), "reading config file");
        let text = std::fs::read_to_string(&path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_toml(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }
}

/// Values given on the command line (or through clap's env fallbacks)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_iterations: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    /// Variable the key was looked up in
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub agent: AgentConfig,
}

impl Settings {
    /// Layer `overrides` over `file` over built-in defaults.
    ///
    /// `env` looks up the variable named by `provider.api_key_env`; an
    /// explicit `--api-key` always wins over it.
    pub fn resolve(
        file: FileConfig,
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let key_var = file
            .provider
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = overrides
            .api_key
            .or_else(|| env(key_var))
            .filter(|key| !key.trim().is_empty());

        let defaults = AgentConfig::default();
        let agent = AgentConfig {
            max_iterations: overrides
                .max_iterations
                .or(file.agent.max_iterations)
                .unwrap_or(defaults.max_iterations),
            model: None,
            temperature: overrides
                .temperature
                .or(file.agent.temperature)
                .or(defaults.temperature),
            max_tokens: overrides
                .max_tokens
                .or(file.agent.max_tokens)
                .or(defaults.max_tokens),
        };

        let settings = Self {
            api_key,
            api_key_env: key_var.to_string(),
            base_url: overrides
                .base_url
                .or(file.provider.base_url)
                .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
            model: overrides
                .model
                .or(file.provider.model)
                .unwrap_or_else(|| OPENROUTER_DEFAULT_MODEL.to_string()),
            timeout_secs: overrides
                .timeout_secs
                .or(file.provider.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            agent,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::config_invalid(message).with_operation("config::resolve"));

        if self.base_url.trim().is_empty() {
            return invalid("base_url must not be empty".into());
        }
        if self.model.trim().is_empty() {
            return invalid("model must not be empty".into());
        }
        if self.timeout_secs == 0 {
            return invalid("timeout_secs must be at least 1".into());
        }
        if let Some(t) = self.agent.temperature {
            if !(0.0..=2.0).contains(&t) {
                return invalid(format!("temperature must be between 0 and 2, got {}", t));
            }
        }
        if self.agent.max_tokens == Some(0) {
            return invalid("max_tokens must be at least 1".into());
        }
        Ok(())
    }

    /// Provider settings for the configured endpoint.
    ///
    /// OpenRouter needs a key. Any other endpoint without a key is treated
    /// as a local OpenAI-compatible server.
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let config = match &self.api_key {
            Some(key) => ProviderConfig::openrouter(key.as_str()).with_base_url(self.base_url.as_str()),
            None if self.base_url.trim_end_matches('/') == OPENROUTER_BASE_URL => {
                return Err(Error::new(
                    ErrorKind::ConfigInvalid,
                    format!("no API key: set {} or pass --api-key", self.api_key_env),
                )
                .with_operation("config::provider"))
            }
            None => ProviderConfig::local(self.base_url.as_str(), self.model.as_str()),
        };
        Ok(config
            .with_model(self.model.as_str())
            .with_timeout(self.timeout_secs))
    }
}
