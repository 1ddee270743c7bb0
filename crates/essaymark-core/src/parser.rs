//! Parser for assessment engine output.
//!
//! Engines answer with a JSON document, sometimes wrapped in markdown
//! fences or surrounded by chatter. The payload is first read into wire
//! structs that accept both the canonical and the legacy field names, then
//! converted through the validating model constructors.

use serde::Deserialize;
use thiserror::Error;

use crate::error::ValidationError;
use crate::model::{AssessmentResult, CriterionGroup, RubricScore};

/// Why engine output could not become an [`AssessmentResult`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// No JSON object was found in the response.
    #[error("engine output contains no JSON object")]
    NoJson,

    /// The JSON did not have the expected shape.
    #[error("engine output is not a well-formed assessment: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The JSON had the right shape but broke a rubric invariant.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Deserialize)]
struct WireAssessment {
    #[serde(default)]
    general_conclusion: String,
    content: WireGroup,
    language: WireGroup,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireGroup {
    #[serde(
        default,
        alias = "content_conclusion",
        alias = "language_conclusion"
    )]
    conclusion: String,
    #[serde(default, alias = "criterias")]
    criteria: Vec<WireCriterion>,
}

#[derive(Debug, Deserialize)]
struct WireCriterion {
    criterion: String,
    score: i64,
    #[serde(default)]
    feedback: Option<String>,
}

impl WireGroup {
    fn into_group(self) -> Result<CriterionGroup, ValidationError> {
        let criteria = self
            .criteria
            .into_iter()
            .map(|c| RubricScore::new(c.criterion, c.score, c.feedback.unwrap_or_default()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CriterionGroup::new(self.conclusion, criteria))
    }
}

/// Parse raw engine output into a validated [`AssessmentResult`].
pub fn parse_assessment(response: &str) -> Result<AssessmentResult, ParseError> {
    let json = extract_json_object(response).ok_or(ParseError::NoJson)?;
    let wire: WireAssessment = serde_json::from_str(json)?;

    let content = wire.content.into_group()?;
    let language = wire.language.into_group()?;
    Ok(AssessmentResult::new(
        wire.general_conclusion,
        content,
        language,
        wire.suggestions,
    )?)
}

/// Locate the JSON object inside an engine response.
///
/// Handles:
/// - A ```json``` fenced block (preferred)
/// - A generic ``` fenced block
/// - Bare JSON, possibly with leading or trailing prose
pub fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(block) = fenced_block(response, &["json"]).or_else(|| fenced_block(response, &[""]))
    {
        return outermost_braces(block);
    }
    outermost_braces(response)
}

fn fenced_block<'a>(response: &'a str, languages: &[&str]) -> Option<&'a str> {
    let mut offset = 0;
    while let Some(start) = response[offset..].find("```") {
        let fence = offset + start;
        let after_fence = fence + 3;
        let line_end = response[after_fence..]
            .find('\n')
            .map(|i| after_fence + i)
            .unwrap_or(response.len());
        let lang = response[after_fence..line_end].trim().to_lowercase();
        let body_start = (line_end + 1).min(response.len());
        // Unclosed fences run to the end of the response.
        let body_end = response[body_start..]
            .find("```")
            .map(|i| body_start + i)
            .unwrap_or(response.len());

        if languages.contains(&lang.as_str()) {
            return Some(&response[body_start..body_end]);
        }
        offset = (body_end + 3).min(response.len());
        if offset >= response.len() {
            break;
        }
    }
    None
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
