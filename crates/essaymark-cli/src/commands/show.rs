//! The `essaymark show` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use essaymark_core::model::HistoryId;
use essaymark_core::traits::ResultRepository;
use essaymark_report::{generate_assessment_html, write_html};

use crate::OutputFormat;

pub async fn execute(
    id: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let id: HistoryId = id
        .parse()
        .with_context(|| format!("invalid assessment id: {id}"))?;

    let repository = super::open_reader(config_path.as_deref())?;
    let entry = repository.fetch_by_id(id).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
        OutputFormat::Html => {
            let path = super::html_path(output, &format!("assessment-{id}.html"));
            write_html(&generate_assessment_html(&entry), &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        OutputFormat::Text | OutputFormat::Markdown => super::print_entry(&entry),
    }
    Ok(())
}
