//! The `essaymark submit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use essaymark_core::model::UserId;
use essaymark_core::traits::ResultRepository;
use essaymark_report::{generate_assessment_html, write_html};

use crate::OutputFormat;

pub async fn execute(
    question: String,
    essay: Option<String>,
    essay_file: Option<PathBuf>,
    user: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let essay = match (essay, essay_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read essay: {}", path.display()))?,
        (None, None) => anyhow::bail!("either --essay or --essay-file is required"),
    };
    anyhow::ensure!(!question.trim().is_empty(), "question must not be empty");
    anyhow::ensure!(!essay.trim().is_empty(), "essay must not be empty");

    let repository = super::open_repository(config_path.as_deref())?;
    let user = UserId::new(user);

    if let Some(engine) = repository.engine_name() {
        eprintln!("Assessing with {engine}...");
    }
    let submission = repository.submit(&user, &question, &essay).await?;
    let entry = repository.fetch_by_id(submission.id).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }
        OutputFormat::Html => {
            let path = super::html_path(output, &format!("assessment-{}.html", entry.id()));
            write_html(&generate_assessment_html(&entry), &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            super::print_entry(&entry);
        }
    }

    let quota = repository.fetch_quota(&user).await?;
    eprintln!("Remaining credits: {}", quota.remaining_credits);
    Ok(())
}
