//! essaymark-providers: Assessment engine integrations.
//!
//! Implements the `AssessmentEngine` trait for OpenAI and Ollama chat
//! models, plus a mock engine for offline runs and tests.

pub mod config;
pub mod error;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompts;
pub mod retry;

pub use config::{create_engine, load_config, EngineSettings, EssaymarkConfig, ProviderConfig};
pub use error::ProviderError;
pub use retry::RetryPolicy;
