//! Progress analytics over a user's assessment history.
//!
//! Every function here takes the history in most-recent-first order (as
//! returned by a [`ResultRepository`](crate::traits::ResultRepository)) and
//! reads only the stored overall scores. Nothing is re-aggregated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::HistoryEntry;

/// Number of entries in each trend window.
pub const TREND_WINDOW: usize = 3;
/// Minimum difference between window means before a trend is reported.
pub const TREND_THRESHOLD: f64 = 0.2;

/// Coarse direction of a user's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    None,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::None => write!(f, "none"),
        }
    }
}

/// Direction of one entry relative to the entry recorded before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowTrend {
    Up,
    Down,
    Flat,
    Unknown,
}

impl RowTrend {
    /// Arrow glyph for terminal and HTML rendering.
    pub fn arrow(&self) -> &'static str {
        match self {
            RowTrend::Up => "↑",
            RowTrend::Down => "↓",
            RowTrend::Flat | RowTrend::Unknown => "–",
        }
    }
}

impl fmt::Display for RowTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowTrend::Up => write!(f, "up"),
            RowTrend::Down => write!(f, "down"),
            RowTrend::Flat => write!(f, "flat"),
            RowTrend::Unknown => write!(f, "unknown"),
        }
    }
}

/// Summary statistics of a history, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_essays: usize,
    pub average_score: f64,
    pub best_score: f64,
    pub trend: Trend,
}

impl HistorySummary {
    fn empty() -> Self {
        Self {
            total_essays: 0,
            average_score: 0.0,
            best_score: 0.0,
            trend: Trend::None,
        }
    }
}

/// Summarize a most-recent-first history.
///
/// An empty history is a valid state and yields zeros with no trend.
pub fn summarize(history: &[HistoryEntry]) -> HistorySummary {
    if history.is_empty() {
        return HistorySummary::empty();
    }

    let scores: Vec<f64> = history.iter().map(HistoryEntry::overall_score).collect();
    let best_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    HistorySummary {
        total_essays: scores.len(),
        average_score: mean(&scores),
        best_score,
        trend: classify_trend(&scores),
    }
}

/// Compare the first and last [`TREND_WINDOW`] scores of the list.
///
/// The windows overlap when fewer than `2 * TREND_WINDOW` scores exist; the
/// comparison is still "first window vs last window" in that case.
pub fn classify_trend(scores: &[f64]) -> Trend {
    if scores.len() < TREND_WINDOW {
        return Trend::None;
    }

    let recent_avg = mean(&scores[..TREND_WINDOW]);
    let older_avg = mean(&scores[scores.len() - TREND_WINDOW..]);

    if recent_avg > older_avg + TREND_THRESHOLD {
        Trend::Up
    } else if recent_avg < older_avg - TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::None
    }
}

/// Compare an entry with the one recorded chronologically before it.
///
/// In a most-recent-first list the previous entry of `history[i]` is
/// `history[i + 1]`.
pub fn compare_to_previous(current: &HistoryEntry, previous: Option<&HistoryEntry>) -> RowTrend {
    let Some(previous) = previous else {
        return RowTrend::Unknown;
    };

    let (now, before) = (current.overall_score(), previous.overall_score());
    if now > before {
        RowTrend::Up
    } else if now < before {
        RowTrend::Down
    } else {
        RowTrend::Flat
    }
}

/// Per-row trend indicators for a most-recent-first history.
pub fn row_trends(history: &[HistoryEntry]) -> Vec<RowTrend> {
    history
        .iter()
        .enumerate()
        .map(|(i, entry)| compare_to_previous(entry, history.get(i + 1)))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
