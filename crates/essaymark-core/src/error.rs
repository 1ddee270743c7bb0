//! Error types surfaced by the assessment core.
//!
//! Validation and aggregation failures are contract violations by the
//! assessment engine and are never coerced into a default value. Repository
//! failures are propagated verbatim to the caller.

use thiserror::Error;

use crate::model::HistoryId;

/// An `AssessmentResult` (or one of its parts) broke a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A criterion group carried no criteria.
    #[error("criterion group '{group}' has no criteria")]
    EmptyGroup { group: String },

    /// A rubric score fell outside the inclusive `[0, 6]` range.
    #[error("criterion '{criterion}' has score {score}, expected {min}..={max}")]
    ScoreOutOfRange {
        criterion: String,
        score: i64,
        min: u8,
        max: u8,
    },

    /// A rubric score had an empty criterion label.
    #[error("criterion label must not be empty")]
    EmptyCriterion,
}

impl ValidationError {
    pub fn empty_group(group: impl Into<String>) -> Self {
        ValidationError::EmptyGroup {
            group: group.into(),
        }
    }

    pub fn score_out_of_range(criterion: impl Into<String>, score: i64) -> Self {
        ValidationError::ScoreOutOfRange {
            criterion: criterion.into(),
            score,
            min: crate::model::MIN_SCORE,
            max: crate::model::MAX_SCORE,
        }
    }
}

/// Aggregation was attempted over zero rubric scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot compute an overall score from an empty rubric")]
pub struct EmptyRubricError;

/// Failures reported by a [`ResultRepository`](crate::traits::ResultRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The assessment engine or its transport failed. Nothing was persisted.
    #[error("submission failed: {0}")]
    Submission(#[source] anyhow::Error),

    /// No history entry exists with the requested id.
    #[error("assessment not found: {0}")]
    NotFound(HistoryId),

    /// Another submission for the same user has not completed yet.
    #[error("a submission for user '{0}' is already in flight")]
    SubmissionInFlight(String),

    /// The engine returned a result that failed validation.
    #[error("assessment engine returned an invalid result: {0}")]
    InvalidResult(#[from] ValidationError),

    /// The engine returned a result with no scores at all.
    #[error(transparent)]
    Aggregation(#[from] EmptyRubricError),

    /// The history store failed to read or write.
    #[error("history store error: {0}")]
    Storage(#[source] anyhow::Error),

    /// The repository was opened for reading and has no assessment engine.
    #[error("no assessment engine configured; this repository is read-only")]
    ReadOnly,
}

impl RepositoryError {
    /// Returns `true` for errors the caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RepositoryError::Submission(_) | RepositoryError::SubmissionInFlight(_)
        )
    }
}
