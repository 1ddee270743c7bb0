//! OpenAI chat completions engine.

use std::time::{Duration, Instant};

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

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible chat completions engine, asking for a JSON object.
pub struct OpenAiEngine {
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    settings: EngineSettings,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl OpenAiEngine {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        org_id: Option<String>,
        settings: EngineSettings,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            org_id,
            settings,
            retry: RetryPolicy::default(),
            client,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn complete(&self, body: &OpenAiRequest<'_>) -> anyhow::Result<String> {
        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(body)
            .send()
            .await
            .map_err(|e| error::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;

        if !response.status().is_success() {
            return Err(error::from_status(response, &self.settings.model).await.into());
        }

        let api_response: OpenAiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        debug!(
            prompt_tokens = api_response.usage.prompt_tokens,
            completion_tokens = api_response.usage.completion_tokens,
            "completion received"
        );

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse.into())
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl AssessmentEngine for OpenAiEngine {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip_all, fields(engine = "openai"))]
    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<AssessmentResult> {
        let start = Instant::now();
        let prompt = user_prompt(&request.question, &request.essay);
        let body = OpenAiRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                OpenAiMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let content = self.retry.run(|| self.complete(&body)).await?;
        let result = parse_assessment(&content)?;

        debug!(
            model = %self.settings.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "essay assessed"
        );
        Ok(result)
    }

    fn available_models(&self) -> Vec<EngineModel> {
        [("gpt-4o", "GPT-4o"), ("gpt-4o-mini", "GPT-4o Mini")]
            .into_iter()
            .map(|(id, name)| EngineModel {
                id: id.into(),
                name: name.into(),
                engine: "openai".into(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use essaymark_core::parser::ParseError;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ASSESSMENT: &str = r#"{
        "general_conclusion": "Solid essay.",
        "content": {"conclusion": "Relevant.", "criteria": [
            {"criterion": "focus", "score": 6, "feedback": "On point."},
            {"criterion": "arguments", "score": 4, "feedback": "Thin in places."}
        ]},
        "language": {"conclusion": "Fluent.", "criteria": [
            {"criterion": "grammar", "score": 5, "feedback": "Few slips."}
        ]},
        "suggestions": ["Add a counterargument"]
    }"#;

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"content": content, "role": "assistant"}, "index": 0}],
            "model": "gpt-4o",
            "usage": {"prompt_tokens": 400, "completion_tokens": 150, "total_tokens": 550}
        })
    }

    fn engine(server: &MockServer) -> OpenAiEngine {
        OpenAiEngine::new("test-key", Some(server.uri()), None, EngineSettings::default())
            .unwrap()
            .with_retry(RetryPolicy::none())
    }

    fn request() -> AssessmentRequest {
        AssessmentRequest::new("Should school uniforms be mandatory?", "They should not...")
    }

    #[tokio::test]
    async fn successful_assessment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 3000,
                "temperature": 0.7,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(ASSESSMENT)))
            .expect(1)
            .mount(&server)
            .await;

        let result = engine(&server).assess(&request()).await.unwrap();
        assert_eq!(result.general_conclusion(), "Solid essay.");
        assert_eq!(result.content().criteria().len(), 2);
        assert_eq!(result.language().criteria()[0].score(), 5);
    }

    #[tokio::test]
    async fn error_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let err = engine(&server).assess(&request()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn unauthorized_is_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = engine(&server).assess(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn out_of_range_output_is_rejected() {
        let server = MockServer::start().await;
        let bad = ASSESSMENT.replace("\"score\": 6", "\"score\": 9");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&bad)))
            .mount(&server)
            .await;

        let err = engine(&server).assess(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": null, "role": "assistant"}, "index": 0}]
            })))
            .mount(&server)
            .await;

        let err = engine(&server).assess(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn oversized_retry_after_saturates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "18446744073709551615"),
            )
            .mount(&server)
            .await;

        let err = engine(&server).assess(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::RateLimited {
                retry_after_ms: u64::MAX
            })
        ));
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(ASSESSMENT)))
            .mount(&server)
            .await;

        let engine = engine(&server).with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
        assert!(engine.assess(&request()).await.is_ok());
    }
}
