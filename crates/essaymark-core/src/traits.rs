//! Trait seams to the collaborators around the core.
//!
//! [`AssessmentEngine`] is implemented by `essaymark-providers`,
//! [`HistoryStore`] by `essaymark-store`, and [`ResultRepository`] by
//! [`AssessmentRepository`](crate::repository::AssessmentRepository), which
//! composes the other two.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::model::{AssessmentResult, HistoryEntry, HistoryId, Submission, UserId, UserQuota};

// ---------------------------------------------------------------------------
// Assessment engine
// ---------------------------------------------------------------------------

/// Something that scores an essay against its question.
///
/// Implementations must be all-or-nothing: either a fully validated
/// [`AssessmentResult`] or an error.
#[async_trait]
pub trait AssessmentEngine: Send + Sync {
    /// Human-readable engine name (e.g. "openai").
    fn name(&self) -> &str;

    /// Assess one submission.
    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<AssessmentResult>;

    /// Models this engine can assess with.
    fn available_models(&self) -> Vec<EngineModel>;
}

/// A single essay submission sent to an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    /// The essay prompt the user answered.
    pub question: String,
    /// The essay text.
    pub essay: String,
}

impl AssessmentRequest {
    pub fn new(question: impl Into<String>, essay: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            essay: essay.into(),
        }
    }
}

/// Information about a model an engine can use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineModel {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Engine name.
    pub engine: String,
}

// ---------------------------------------------------------------------------
// History store
// ---------------------------------------------------------------------------

/// Durable storage of history entries and user credits.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a freshly recorded entry for `user`.
    async fn append(&self, user: &UserId, entry: &HistoryEntry) -> anyhow::Result<()>;

    /// All entries for `user`, most recent first.
    async fn list(&self, user: &UserId) -> anyhow::Result<Vec<HistoryEntry>>;

    /// A single entry by id, if present.
    async fn get(&self, id: HistoryId) -> anyhow::Result<Option<HistoryEntry>>;

    /// Remaining credits for `user`. Unknown users get the store's initial
    /// allowance.
    async fn quota(&self, user: &UserId) -> anyhow::Result<UserQuota>;
}

// ---------------------------------------------------------------------------
// Result repository
// ---------------------------------------------------------------------------

/// The contract presentation code consumes: submit essays and read history.
///
/// Errors are propagated verbatim; no retries happen at this level.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Assess and persist a new submission.
    async fn submit(
        &self,
        user: &UserId,
        question: &str,
        essay: &str,
    ) -> Result<Submission, RepositoryError>;

    /// The user's history, most recent first.
    async fn fetch_history(&self, user: &UserId) -> Result<Vec<HistoryEntry>, RepositoryError>;

    /// One history entry, or [`RepositoryError::NotFound`].
    async fn fetch_by_id(&self, id: HistoryId) -> Result<HistoryEntry, RepositoryError>;

    /// Remaining credits, for display.
    async fn fetch_quota(&self, user: &UserId) -> Result<UserQuota, RepositoryError>;
}
