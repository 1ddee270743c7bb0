//! The `essaymark init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("essaymark.toml").exists() {
        println!("essaymark.toml already exists, skipping.");
    } else {
        std::fs::write("essaymark.toml", SAMPLE_CONFIG)?;
        println!("Created essaymark.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY, or switch default_provider to \"mock\" to try it offline");
    println!("  2. Run: essaymark submit --question \"...\" --essay-file essay.txt");
    println!("  3. Run: essaymark history");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# essaymark configuration

default_provider = "openai"
default_model = "gpt-4o"
temperature = 0.7
max_tokens = 3000
store_dir = "./essaymark-data"
initial_credits = 2

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[providers.mock]
type = "mock"
"#;
