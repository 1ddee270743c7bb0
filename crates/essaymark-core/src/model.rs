//! Core data model types for essaymark.
//!
//! A rubric-scored [`AssessmentResult`] is produced by an assessment engine
//! and paired with the submission it judged in a [`HistoryEntry`]. Every
//! constructor (and every deserialization path) validates its input; nothing
//! is clamped or defaulted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EmptyRubricError, ValidationError};
use crate::scoring::compute_overall_score;

/// Lowest score a single criterion may receive.
pub const MIN_SCORE: u8 = 0;
/// Highest score a single criterion may receive.
pub const MAX_SCORE: u8 = 6;

/// A single criterion's score and feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRubricScore")]
pub struct RubricScore {
    criterion: String,
    score: u8,
    feedback: String,
}

#[derive(Deserialize)]
struct RawRubricScore {
    criterion: String,
    score: i64,
    #[serde(default)]
    feedback: Option<String>,
}

impl TryFrom<RawRubricScore> for RubricScore {
    type Error = ValidationError;

    fn try_from(raw: RawRubricScore) -> Result<Self, Self::Error> {
        RubricScore::new(raw.criterion, raw.score, raw.feedback.unwrap_or_default())
    }
}

impl RubricScore {
    /// Create a rubric score, rejecting empty labels and out-of-range scores.
    pub fn new(
        criterion: impl Into<String>,
        score: i64,
        feedback: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let criterion = criterion.into();
        if criterion.trim().is_empty() {
            return Err(ValidationError::EmptyCriterion);
        }
        if score < i64::from(MIN_SCORE) || score > i64::from(MAX_SCORE) {
            return Err(ValidationError::score_out_of_range(criterion, score));
        }
        Ok(Self {
            criterion,
            score: score as u8,
            feedback: feedback.into(),
        })
    }

    pub fn criterion(&self) -> &str {
        &self.criterion
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

/// A named rubric dimension: a conclusion plus its ordered criteria.
///
/// Emptiness is checked when the group is placed into an
/// [`AssessmentResult`], where the group's name is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionGroup {
    conclusion: String,
    criteria: Vec<RubricScore>,
}

impl CriterionGroup {
    pub fn new(conclusion: impl Into<String>, criteria: Vec<RubricScore>) -> Self {
        Self {
            conclusion: conclusion.into(),
            criteria,
        }
    }

    pub fn conclusion(&self) -> &str {
        &self.conclusion
    }

    pub fn criteria(&self) -> &[RubricScore] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Iterate over the raw criterion scores in order.
    pub fn scores(&self) -> impl Iterator<Item = u8> + '_ {
        self.criteria.iter().map(RubricScore::score)
    }
}

/// The full engine output for one submission.
///
/// The overall score is deliberately not a field; use
/// [`compute_overall_score`] so it can never drift from the criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAssessmentResult")]
pub struct AssessmentResult {
    general_conclusion: String,
    content: CriterionGroup,
    language: CriterionGroup,
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
struct RawAssessmentResult {
    general_conclusion: String,
    content: CriterionGroup,
    language: CriterionGroup,
    #[serde(default)]
    suggestions: Vec<String>,
}

impl TryFrom<RawAssessmentResult> for AssessmentResult {
    type Error = ValidationError;

    fn try_from(raw: RawAssessmentResult) -> Result<Self, Self::Error> {
        AssessmentResult::new(
            raw.general_conclusion,
            raw.content,
            raw.language,
            raw.suggestions,
        )
    }
}

impl AssessmentResult {
    /// Assemble a result, rejecting groups without criteria.
    pub fn new(
        general_conclusion: impl Into<String>,
        content: CriterionGroup,
        language: CriterionGroup,
        suggestions: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if content.is_empty() {
            return Err(ValidationError::empty_group("content"));
        }
        if language.is_empty() {
            return Err(ValidationError::empty_group("language"));
        }
        Ok(Self {
            general_conclusion: general_conclusion.into(),
            content,
            language,
            suggestions,
        })
    }

    pub fn general_conclusion(&self) -> &str {
        &self.general_conclusion
    }

    pub fn content(&self) -> &CriterionGroup {
        &self.content
    }

    pub fn language(&self) -> &CriterionGroup {
        &self.language
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Named groups in rubric order: content, then language.
    pub fn groups(&self) -> [(&'static str, &CriterionGroup); 2] {
        [("content", &self.content), ("language", &self.language)]
    }
}

/// Opaque, stable identifier of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(Uuid);

impl HistoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HistoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Identity of the user who owns a history, as handed over by the
/// identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One persisted submission together with its canonical overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: HistoryId,
    question: String,
    essay: String,
    result: AssessmentResult,
    timestamp: DateTime<Utc>,
    overall_score: f64,
}

impl HistoryEntry {
    /// Create a new entry, aggregating the overall score exactly once.
    pub fn record(
        question: impl Into<String>,
        essay: impl Into<String>,
        result: AssessmentResult,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EmptyRubricError> {
        let overall_score = compute_overall_score(&result)?;
        Ok(Self {
            id: HistoryId::new(),
            question: question.into(),
            essay: essay.into(),
            result,
            timestamp,
            overall_score,
        })
    }

    /// Rebuild an entry exactly as a history store persisted it.
    ///
    /// The stored score is kept as-is even if the aggregation formula has
    /// changed since the entry was recorded.
    pub fn from_stored(
        id: HistoryId,
        question: impl Into<String>,
        essay: impl Into<String>,
        result: AssessmentResult,
        timestamp: DateTime<Utc>,
        overall_score: f64,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            essay: essay.into(),
            result,
            timestamp,
            overall_score,
        }
    }

    pub fn id(&self) -> HistoryId {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn essay(&self) -> &str {
        &self.essay
    }

    pub fn result(&self) -> &AssessmentResult {
        &self.result
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }
}

/// Sort entries into the most-recent-first order the analytics expect.
pub fn sort_most_recent_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Remaining assessment credits, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuota {
    pub remaining_credits: u32,
}

/// The answer to a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: HistoryId,
    pub result: AssessmentResult,
}
