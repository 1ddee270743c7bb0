//! Subcommand implementations.

pub mod history;
pub mod init;
pub mod quota;
pub mod show;
pub mod submit;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tracing::debug;

use essaymark_core::model::HistoryEntry;
use essaymark_core::scoring::{round_one_decimal, score_color_band, score_label};
use essaymark_core::AssessmentRepository;
use essaymark_providers::config::{load_config_from, EssaymarkConfig};
use essaymark_providers::create_engine;
use essaymark_store::JsonFileStore;

/// Load the config and wire the store only, for read-only commands.
pub(crate) fn open_store(config_path: Option<&Path>) -> Result<(EssaymarkConfig, JsonFileStore)> {
    let config = load_config_from(config_path)?;
    let store = JsonFileStore::with_initial_credits(&config.store_dir, config.initial_credits);
    debug!(store = %config.store_dir.display(), "store opened");
    Ok((config, store))
}

/// Load the config and wire engine and store into a repository.
pub(crate) fn open_repository(config_path: Option<&Path>) -> Result<AssessmentRepository> {
    let (config, store) = open_store(config_path)?;
    let engine = create_engine(
        config.default_provider_config()?,
        config.engine_settings(),
        config.retry_policy(),
    )?;
    Ok(AssessmentRepository::new(engine, Arc::new(store)))
}

/// Build a read-only repository over the store. No engine is created, so
/// viewing history never needs provider credentials.
pub(crate) fn open_reader(config_path: Option<&Path>) -> Result<AssessmentRepository> {
    let (_, store) = open_store(config_path)?;
    Ok(AssessmentRepository::read_only(Arc::new(store)))
}

/// Print one assessment as text.
pub(crate) fn print_entry(entry: &HistoryEntry) {
    let result = entry.result();
    let score = entry.overall_score();

    println!("Assessment {}", entry.id());
    println!("Question: {}", entry.question());
    println!(
        "Overall score: {:.1} / {} ({})",
        round_one_decimal(score),
        essaymark_core::model::MAX_SCORE,
        score_color_band(score)
    );
    println!("\n{}", result.general_conclusion());

    for (name, group) in result.groups() {
        let mut table = Table::new();
        table.set_header(vec!["Criterion", "Score", "Label", "Feedback"]);
        for criterion in group.criteria() {
            table.add_row(vec![
                Cell::new(criterion.criterion()),
                Cell::new(criterion.score()),
                Cell::new(score_label(criterion.score())),
                Cell::new(criterion.feedback()),
            ]);
        }
        println!("\n{name}: {}", group.conclusion());
        println!("{table}");
    }

    if !result.suggestions().is_empty() {
        println!("\nSuggestions:");
        for suggestion in result.suggestions() {
            println!("  - {suggestion}");
        }
    }
}

/// Default file name for html output.
pub(crate) fn html_path(output: Option<PathBuf>, default: &str) -> PathBuf {
    output.unwrap_or_else(|| PathBuf::from(default))
}
