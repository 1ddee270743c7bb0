//! The `essaymark history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use essaymark_core::model::UserId;
use essaymark_core::report::{trend_phrase, truncate, HistoryReport};
use essaymark_core::scoring::round_one_decimal;
use essaymark_core::traits::ResultRepository;
use essaymark_report::{generate_history_html, write_html};

use crate::OutputFormat;

pub async fn execute(
    user: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let repository = super::open_reader(config_path.as_deref())?;
    let user = UserId::new(user);
    let history = repository.fetch_history(&user).await?;
    let report = HistoryReport::from_history(user, &history);

    match format {
        OutputFormat::Json => match output {
            Some(path) => {
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        },
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Html => {
            let path = super::html_path(output, "history.html");
            write_html(&generate_history_html(&report), &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        OutputFormat::Text => print_summary(&report),
    }
    Ok(())
}

fn print_summary(report: &HistoryReport) {
    let s = &report.summary;
    println!(
        "{} essays, average {:.1}, best {:.1}, trend {}",
        s.total_essays,
        round_one_decimal(s.average_score),
        round_one_decimal(s.best_score),
        trend_phrase(s.trend)
    );

    if report.rows.is_empty() {
        println!("No essays assessed yet.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Date", "Question", "Score", "Band", "Trend"]);
    for row in &report.rows {
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(row.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(truncate(&row.question, 40)),
            Cell::new(format!("{:.1}", row.overall_score)),
            Cell::new(row.band),
            Cell::new(row.trend.arrow()),
        ]);
    }
    println!("{table}");
}
