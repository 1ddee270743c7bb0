//! essaymark-core: Assessment model, rubric scoring, and progress analytics.
//!
//! This crate defines the rubric-scored result model, the aggregation of
//! criterion scores into an overall score, the trend analysis over a user's
//! history, and the trait seams to assessment engines and history stores.

pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod repository;
pub mod scoring;
pub mod statistics;
pub mod traits;

pub use error::{EmptyRubricError, RepositoryError, ValidationError};
pub use model::{
    AssessmentResult, CriterionGroup, HistoryEntry, HistoryId, RubricScore, Submission, UserId,
    UserQuota,
};
pub use repository::AssessmentRepository;
pub use scoring::{compute_overall_score, score_color_band, score_label, ScoreBand, ScoreLabel};
pub use statistics::{compare_to_previous, summarize, HistorySummary, RowTrend, Trend};
pub use traits::{AssessmentEngine, HistoryStore, ResultRepository};
