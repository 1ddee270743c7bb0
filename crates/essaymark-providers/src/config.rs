//! Configuration and engine factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use essaymark_core::traits::AssessmentEngine;

use crate::mock::MockEngine;
use crate::ollama::OllamaEngine;
use crate::openai::OpenAiEngine;
use crate::retry::RetryPolicy;

/// Configuration for a single assessment engine.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    Mock {
        /// File holding the engine output to replay; the built-in sample
        /// result when absent.
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { fixture } => {
                f.debug_struct("Mock").field("fixture", fixture).finish()
            }
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Model parameters shared by chat-model engines.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Top-level essaymark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssaymarkConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider to assess with.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model to assess with.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Upper bound on the length of one assessment.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Max retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Directory of the JSON history store.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Credits a new user starts with.
    #[serde(default = "default_initial_credits")]
    pub initial_credits: u32,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    3000
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("./essaymark-data")
}
fn default_initial_credits() -> u32 {
    2
}

impl Default for EssaymarkConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            store_dir: default_store_dir(),
            initial_credits: default_initial_credits(),
        }
    }
}

impl EssaymarkConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            model: self.default_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// The configured default provider.
    pub fn default_provider_config(&self) -> Result<&ProviderConfig> {
        self.providers.get(&self.default_provider).with_context(|| {
            format!(
                "provider '{}' is not configured (run `essaymark init` to create a config)",
                self.default_provider
            )
        })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
        ProviderConfig::Mock { fixture } => ProviderConfig::Mock {
            fixture: fixture.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `essaymark.toml` in the current directory
/// 2. `~/.config/essaymark/config.toml`
///
/// Environment variable override: `ESSAYMARK_OPENAI_KEY`.
pub fn load_config() -> Result<EssaymarkConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EssaymarkConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("essaymark.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<EssaymarkConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EssaymarkConfig::default(),
    };

    if let Ok(key) = std::env::var("ESSAYMARK_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("essaymark"))
}

/// Create an engine from its provider configuration.
pub fn create_engine(
    config: &ProviderConfig,
    settings: EngineSettings,
    retry: RetryPolicy,
) -> Result<Arc<dyn AssessmentEngine>> {
    let engine: Arc<dyn AssessmentEngine> = match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "OpenAI API key is empty (set ESSAYMARK_OPENAI_KEY or api_key in the config)"
            );
            Arc::new(
                OpenAiEngine::new(api_key, base_url.clone(), org_id.clone(), settings)?
                    .with_retry(retry),
            )
        }
        ProviderConfig::Ollama { base_url } => {
            Arc::new(OllamaEngine::new(base_url, settings)?.with_retry(retry))
        }
        ProviderConfig::Mock { fixture: Some(path) } => Arc::new(MockEngine::from_fixture(path)?),
        ProviderConfig::Mock { fixture: None } => Arc::new(MockEngine::sample()),
    };
    Ok(engine)
}
