//! essaymark CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "essaymark", version, about = "Rubric-based essay assessment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
    Html,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess an essay and add it to the history
    Submit {
        /// The question the essay answers
        #[arg(long)]
        question: String,

        /// Essay text
        #[arg(long, conflicts_with = "essay_file", required_unless_present = "essay_file")]
        essay: Option<String>,

        /// Read the essay from a file
        #[arg(long)]
        essay_file: Option<PathBuf>,

        /// Whose history the assessment belongs to
        #[arg(long, env = "ESSAYMARK_USER", default_value = "local")]
        user: String,

        /// Output format: text, json, html
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write html output here instead of the default file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show a user's assessment history with summary statistics
    History {
        #[arg(long, env = "ESSAYMARK_USER", default_value = "local")]
        user: String,

        /// Output format: text, json, markdown, html
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write json or html output to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show one assessment by id
    Show {
        /// History entry id
        #[arg(long)]
        id: String,

        /// Output format: text, json, html
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write html output here instead of the default file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show remaining assessment credits
    Quota {
        #[arg(long, env = "ESSAYMARK_USER", default_value = "local")]
        user: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "essaymark=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Submit {
            question,
            essay,
            essay_file,
            user,
            format,
            output,
            config,
        } => {
            commands::submit::execute(question, essay, essay_file, user, format, output, config)
                .await
        }
        Commands::History {
            user,
            format,
            output,
            config,
        } => commands::history::execute(user, format, output, config).await,
        Commands::Show {
            id,
            format,
            output,
            config,
        } => commands::show::execute(id, format, output, config).await,
        Commands::Quota { user, config } => commands::quota::execute(user, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
