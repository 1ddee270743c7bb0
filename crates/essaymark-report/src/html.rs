//! HTML report generator.
//!
//! Produces self-contained HTML pages with all CSS inlined: one for a
//! user's history, one for a single assessment.

use std::path::Path;

use anyhow::{Context, Result};

use essaymark_core::model::{CriterionGroup, HistoryEntry, MAX_SCORE};
use essaymark_core::report::{trend_phrase, truncate, HistoryReport};
use essaymark_core::scoring::{round_one_decimal, score_color_band, score_label, ScoreBand};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn band_class(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::High => "band-high",
        ScoreBand::Medium => "band-medium",
        ScoreBand::Low => "band-low",
    }
}

fn page_start(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

/// Generate the history page: summary cards and one row per essay.
pub fn generate_history_html(report: &HistoryReport) -> String {
    let mut html = String::new();
    let s = &report.summary;

    page_start(&mut html, &format!("Essay history for {}", report.user));

    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>Essay history for {}</h1>\n",
        html_escape(report.user.as_str())
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Generated {}</p>\n",
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"cards\">\n");
    let cards = [
        ("Essays", s.total_essays.to_string(), None),
        (
            "Average score",
            format!("{:.1}", round_one_decimal(s.average_score)),
            Some(score_color_band(s.average_score)),
        ),
        (
            "Best score",
            format!("{:.1}", round_one_decimal(s.best_score)),
            Some(score_color_band(s.best_score)),
        ),
        ("Trend", trend_phrase(s.trend).to_string(), None),
    ];
    for (label, value, band) in cards {
        let class = band.map(band_class).unwrap_or("");
        html.push_str(&format!(
            "<div class=\"card {class}\"><span class=\"label\">{label}</span><span class=\"value\">{value}</span></div>\n"
        ));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    if report.rows.is_empty() {
        html.push_str("<p class=\"empty\">No essays assessed yet.</p>\n");
    } else {
        html.push_str("<table>\n");
        html.push_str(
            "<thead><tr><th>Date</th><th>Question</th><th>Score</th><th>Trend</th></tr></thead>\n",
        );
        html.push_str("<tbody>\n");
        for row in &report.rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td title=\"{}\">{}</td><td class=\"{}\">{:.1}</td><td class=\"trend\">{}</td></tr>\n",
                row.timestamp.format("%Y-%m-%d %H:%M"),
                row.id,
                html_escape(&truncate(&row.question, 80)),
                band_class(row.band),
                row.overall_score,
                row.trend.arrow()
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Generate the page for one assessed essay.
pub fn generate_assessment_html(entry: &HistoryEntry) -> String {
    let mut html = String::new();
    let result = entry.result();
    let band = score_color_band(entry.overall_score());

    page_start(&mut html, "Essay assessment");

    html.push_str("<header>\n");
    html.push_str("<h1>Essay assessment</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} | {}</p>\n",
        entry.id(),
        entry.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!(
        "<p class=\"question\">{}</p>\n",
        html_escape(entry.question())
    ));
    html.push_str("</header>\n");

    html.push_str(&format!(
        "<section class=\"cards\"><div class=\"card {}\"><span class=\"label\">Overall score</span><span class=\"value\">{:.1} / {}</span></div></section>\n",
        band_class(band),
        round_one_decimal(entry.overall_score()),
        MAX_SCORE
    ));

    html.push_str(&format!(
        "<section><h2>Conclusion</h2>\n<p>{}</p>\n</section>\n",
        html_escape(result.general_conclusion())
    ));

    for (name, group) in result.groups() {
        push_group(&mut html, name, group);
    }

    if !result.suggestions().is_empty() {
        html.push_str("<section><h2>Suggestions</h2>\n<ul>\n");
        for suggestion in result.suggestions() {
            html.push_str(&format!("<li>{}</li>\n", html_escape(suggestion)));
        }
        html.push_str("</ul>\n</section>\n");
    }

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Essay</summary>\n");
    html.push_str(&format!("<pre>{}</pre>\n", html_escape(entry.essay())));
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

fn push_group(html: &mut String, name: &str, group: &CriterionGroup) {
    let mut title = name.to_string();
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    html.push_str(&format!("<section class=\"group\"><h2>{title}</h2>\n"));
    if !group.conclusion().is_empty() {
        html.push_str(&format!("<p>{}</p>\n", html_escape(group.conclusion())));
    }
    html.push_str("<table>\n<thead><tr><th>Criterion</th><th>Score</th><th>Feedback</th></tr></thead>\n<tbody>\n");
    for criterion in group.criteria() {
        let score = f64::from(criterion.score());
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{}/{} <span class=\"label\">{}</span></td><td>{}</td></tr>\n",
            html_escape(criterion.criterion()),
            band_class(score_color_band(score)),
            criterion.score(),
            MAX_SCORE,
            score_label(score),
            html_escape(criterion.feedback())
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");
}

/// Write an HTML page to a file, creating parent directories.
pub fn write_html(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --high: #dcfce7; --medium: #fef9c3; --low: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --high: #064e3b; --medium: #713f12; --low: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.question { font-style: italic; }
.cards { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 8rem; }
.card .label { display: block; color: #6b7280; font-size: 0.85rem; }
.card .value { display: block; font-size: 1.6rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
td .label { color: #6b7280; font-size: 0.85rem; }
.trend { text-align: center; }
.band-high { background: var(--high); }
.band-medium { background: var(--medium); }
.band-low { background: var(--low); }
pre { white-space: pre-wrap; padding: 1rem; background: var(--border); border-radius: 8px; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
