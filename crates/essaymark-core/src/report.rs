//! History report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{HistoryEntry, HistoryId, UserId};
use crate::scoring::{round_one_decimal, ScoreBand};
use crate::statistics::{row_trends, summarize, HistorySummary, RowTrend, Trend};

/// A rendered snapshot of one user's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Whose history this is.
    pub user: UserId,
    /// Summary statistics at full precision.
    pub summary: HistorySummary,
    /// One row per entry, most recent first.
    pub rows: Vec<HistoryRow>,
}

/// One history entry as shown in a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: HistoryId,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub overall_score: f64,
    pub band: ScoreBand,
    pub trend: RowTrend,
}

impl HistoryReport {
    /// Build a report from a most-recent-first history.
    pub fn from_history(user: UserId, history: &[HistoryEntry]) -> Self {
        let rows = history
            .iter()
            .zip(row_trends(history))
            .map(|(entry, trend)| HistoryRow {
                id: entry.id(),
                timestamp: entry.timestamp(),
                question: entry.question().to_string(),
                overall_score: entry.overall_score(),
                band: ScoreBand::for_score(entry.overall_score()),
                trend,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user,
            summary: summarize(history),
            rows,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: HistoryReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let s = &self.summary;

        md.push_str(&format!("## Essay history for {}\n\n", self.user));
        md.push_str(&format!(
            "**Summary:** {} essays, average {:.1}, best {:.1}, trend {}\n\n",
            s.total_essays,
            round_one_decimal(s.average_score),
            round_one_decimal(s.best_score),
            trend_phrase(s.trend)
        ));

        if self.rows.is_empty() {
            md.push_str("No essays assessed yet.\n");
            return md;
        }

        md.push_str("| Date | Question | Score | Band | Trend |\n");
        md.push_str("|------|----------|-------|------|-------|\n");
        for row in &self.rows {
            md.push_str(&format!(
                "| {} | {} | {:.1} | {} | {} |\n",
                row.timestamp.format("%Y-%m-%d"),
                truncate(&row.question, 60).replace('|', "\\|"),
                row.overall_score,
                row.band,
                row.trend.arrow()
            ));
        }

        md
    }
}

/// Human phrasing of an overall trend.
pub fn trend_phrase(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "improving",
        Trend::Down => "declining",
        Trend::None => "steady",
    }
}

/// Shorten text to at most `max` characters, appending an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
