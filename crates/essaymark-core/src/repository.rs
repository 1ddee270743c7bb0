//! Engine-backed result repository.
//!
//! Coordinates one submission end to end: the assessment engine produces a
//! validated result, the overall score is aggregated once, and the resulting
//! history entry is appended to the store. Nothing is persisted unless every
//! step succeeds.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::error::RepositoryError;
use crate::model::{sort_most_recent_first, HistoryEntry, HistoryId, Submission, UserId, UserQuota};
use crate::parser::ParseError;
use crate::traits::{AssessmentEngine, AssessmentRequest, HistoryStore, ResultRepository};

/// [`ResultRepository`] over an injected engine and history store.
///
/// A repository built with [`AssessmentRepository::read_only`] has no engine
/// and rejects every submission with [`RepositoryError::ReadOnly`].
pub struct AssessmentRepository {
    engine: Option<Arc<dyn AssessmentEngine>>,
    store: Arc<dyn HistoryStore>,
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl AssessmentRepository {
    pub fn new(engine: Arc<dyn AssessmentEngine>, store: Arc<dyn HistoryStore>) -> Self {
        Self::with_engine(Some(engine), store)
    }

    /// A repository for history and quota lookups only.
    pub fn read_only(store: Arc<dyn HistoryStore>) -> Self {
        Self::with_engine(None, store)
    }

    fn with_engine(engine: Option<Arc<dyn AssessmentEngine>>, store: Arc<dyn HistoryStore>) -> Self {
        Self {
            engine,
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Name of the engine submissions are sent to, if there is one.
    pub fn engine_name(&self) -> Option<&str> {
        self.engine.as_deref().map(|engine| engine.name())
    }
}

/// Marks a user as having a submission in flight until dropped.
///
/// Dropping happens on completion and when the submitting future is
/// cancelled, so an abandoned request never blocks the next one.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<UserId>>>,
    user: UserId,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<UserId>>>, user: &UserId) -> Result<Self, RepositoryError> {
        let mut users = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !users.insert(user.clone()) {
            return Err(RepositoryError::SubmissionInFlight(user.to_string()));
        }
        Ok(Self {
            set: Arc::clone(set),
            user: user.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut users = self
            .set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        users.remove(&self.user);
    }
}

/// Classify an engine failure without string matching.
fn engine_error(err: anyhow::Error) -> RepositoryError {
    match err.downcast_ref::<ParseError>() {
        Some(ParseError::Invalid(validation)) => RepositoryError::InvalidResult(validation.clone()),
        _ => RepositoryError::Submission(err),
    }
}

#[async_trait]
impl ResultRepository for AssessmentRepository {
    #[instrument(skip(self, question, essay), fields(user = %user))]
    async fn submit(
        &self,
        user: &UserId,
        question: &str,
        essay: &str,
    ) -> Result<Submission, RepositoryError> {
        let engine = self.engine.as_deref().ok_or(RepositoryError::ReadOnly)?;
        let _guard = InFlightGuard::acquire(&self.in_flight, user)?;

        let request = AssessmentRequest::new(question, essay);
        let result = engine.assess(&request).await.map_err(|e| {
            tracing::warn!("assessment failed: {e:#}");
            engine_error(e)
        })?;

        let entry = HistoryEntry::record(question, essay, result, Utc::now())?;
        self.store
            .append(user, &entry)
            .await
            .map_err(RepositoryError::Storage)?;

        tracing::info!(
            id = %entry.id(),
            engine = engine.name(),
            overall_score = entry.overall_score(),
            "assessment recorded"
        );

        Ok(Submission {
            id: entry.id(),
            result: entry.result().clone(),
        })
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_history(&self, user: &UserId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let mut history = self
            .store
            .list(user)
            .await
            .map_err(RepositoryError::Storage)?;
        sort_most_recent_first(&mut history);
        tracing::debug!(entries = history.len(), "history fetched");
        Ok(history)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_by_id(&self, id: HistoryId) -> Result<HistoryEntry, RepositoryError> {
        self.store
            .get(id)
            .await
            .map_err(RepositoryError::Storage)?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn fetch_quota(&self, user: &UserId) -> Result<UserQuota, RepositoryError> {
        self.store
            .quota(user)
            .await
            .map_err(RepositoryError::Storage)
    }
}
