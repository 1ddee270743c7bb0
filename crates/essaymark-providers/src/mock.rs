//! Mock engine for offline runs and tests.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;

use essaymark_core::model::{AssessmentResult, CriterionGroup, RubricScore};
use essaymark_core::parser::parse_assessment;
use essaymark_core::traits::{AssessmentEngine, AssessmentRequest, EngineModel};

enum Reply {
    Result(AssessmentResult),
    Fail(String),
}

/// An engine that answers every request with a canned reply.
pub struct MockEngine {
    reply: Reply,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<AssessmentRequest>>,
}

impl MockEngine {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always answer with `result`.
    pub fn with_fixed_result(result: AssessmentResult) -> Self {
        Self::with_reply(Reply::Result(result))
    }

    /// Always answer with the result stored in a fixture file. The file may
    /// hold raw engine output (fenced or not).
    pub fn from_fixture(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture: {}", path.display()))?;
        let result = parse_assessment(&content)
            .with_context(|| format!("invalid fixture: {}", path.display()))?;
        Ok(Self::with_fixed_result(result))
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    /// A mid-range assessment (overall 38 / 7).
    pub fn sample() -> Self {
        Self::with_fixed_result(sample_result())
    }

    /// Get the number of calls made to this engine.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this engine.
    pub fn last_request(&self) -> Option<AssessmentRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// The built-in result the sample engine returns.
pub fn sample_result() -> AssessmentResult {
    let score = |criterion: &str, value: i64, feedback: &str| {
        RubricScore::new(criterion, value, feedback)
    };
    let build = || -> Result<AssessmentResult, essaymark_core::ValidationError> {
        let content = CriterionGroup::new(
            "The essay answers the question with a clear position.",
            vec![
                score("focus", 6, "Stays on the question throughout.")?,
                score("arguments", 5, "Convincing, with one weaker point.")?,
                score("structure", 6, "Clear introduction, body and conclusion.")?,
                score("examples", 4, "Examples are relevant but generic.")?,
            ],
        );
        let language = CriterionGroup::new(
            "Readable, with some repeated phrasing.",
            vec![
                score("grammar", 6, "No noticeable errors.")?,
                score("vocabulary", 5, "Varied word choice.")?,
                score("style", 6, "Consistent register.")?,
            ],
        );
        AssessmentResult::new(
            "A well organized essay with a clear argument.",
            content,
            language,
            vec![
                "Support each argument with a concrete example.".into(),
                "Vary sentence openings.".into(),
            ],
        )
    };
    build().unwrap_or_else(|e| unreachable!("sample assessment is valid: {e}"))
}

#[async_trait]
impl AssessmentEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<AssessmentResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        match &self.reply {
            Reply::Result(result) => Ok(result.clone()),
            Reply::Fail(message) => anyhow::bail!("{message}"),
        }
    }

    fn available_models(&self) -> Vec<EngineModel> {
        vec![EngineModel {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            engine: "mock".into(),
        }]
    }
}
