//! Ollama (local model) engine.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use essaymark_core::model::AssessmentResult;
use essaymark_core::parser::parse_assessment;
use essaymark_core::traits::{AssessmentEngine, AssessmentRequest, EngineModel};

use crate::config::EngineSettings;
use crate::error::{self, ProviderError};
use crate::prompts::{user_prompt, SYSTEM_PROMPT};
use crate::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 300; // Local models are slower

/// Engine backed by a local Ollama instance in JSON mode.
pub struct OllamaEngine {
    base_url: String,
    settings: EngineSettings,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl OllamaEngine {
    pub fn new(base_url: &str, settings: EngineSettings) -> anyhow::Result<Self> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            settings,
            retry: RetryPolicy::default(),
            client,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn chat(&self, body: &OllamaRequest<'_>) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::NetworkError(format!(
                        "Ollama not reachable at {}. Is it running? Start with: ollama serve",
                        self.base_url
                    ))
                } else {
                    error::from_reqwest(e, DEFAULT_TIMEOUT_SECS)
                }
            })?;

        if !response.status().is_success() {
            return Err(error::from_status(response, &self.settings.model).await.into());
        }

        let api_response: OllamaResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        debug!(
            prompt_tokens = api_response.prompt_eval_count.unwrap_or(0),
            completion_tokens = api_response.eval_count.unwrap_or(0),
            "chat response received"
        );

        let content = api_response.message.content;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }
        Ok(content)
    }

    /// Fetch the models pulled into the Ollama instance.
    pub async fn list_models_async(&self) -> anyhow::Result<Vec<EngineModel>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|_| {
                ProviderError::NetworkError(format!(
                    "Ollama not reachable at {}. Is it running? Start with: ollama serve",
                    self.base_url
                ))
            })?;

        let tags: OllamaTagsResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse tags response: {e}"),
            })?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| EngineModel {
                id: m.name.clone(),
                name: m.name,
                engine: "ollama".into(),
            })
            .collect())
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelEntry>,
}

#[derive(Deserialize)]
struct OllamaModelEntry {
    name: String,
}

#[async_trait]
impl AssessmentEngine for OllamaEngine {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip_all, fields(engine = "ollama"))]
    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<AssessmentResult> {
        let prompt = user_prompt(&request.question, &request.essay);
        let body = OllamaRequest {
            model: &self.settings.model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                OllamaMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.settings.temperature,
                num_predict: self.settings.max_tokens,
            },
        };

        let content = self.retry.run(|| self.chat(&body)).await?;
        Ok(parse_assessment(&content)?)
    }

    fn available_models(&self) -> Vec<EngineModel> {
        // Listing needs a network call; see `list_models_async`.
        vec![EngineModel {
            id: self.settings.model.clone(),
            name: self.settings.model.clone(),
            engine: "ollama".into(),
        }]
    }
}
