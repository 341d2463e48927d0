use crate::crew::CrewProfile;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenAI-compatible base URL of the completion provider
    pub api_base: String,
    /// environment variable holding the provider API key
    pub api_key_env: String,
    pub output_dir: PathBuf,
    pub profile: CrewProfile,
    pub models: ModelConfig,
    pub topics: Vec<String>,
    pub retry: RetryConfig,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            output_dir: PathBuf::from("output/generated"),
            profile: CrewProfile::default(),
            models: ModelConfig::default(),
            topics: [
                "LLM Security Fundamentals",
                "Prompt Injection Prevention",
                "AI Model Governance",
                "Zero Trust for AI Systems",
                "ISO 42001 Implementation",
                "OWASP LLM Top 10",
                "AI Bias Detection",
                "Secure AI Deployment",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Model used by each role. The single-role profile uses the writer model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub researcher: String,
    pub writer: String,
    pub validator: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            researcher: "deepseek-r1-distill-llama-70b".to_string(),
            writer: "llama-3.3-70b-versatile".to_string(),
            validator: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub jitter_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_secs: 60,
            jitter_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: agent::tools::WebSearch::DEFAULT_ENDPOINT.to_string(),
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_chars: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads the provider key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))
    }
}
