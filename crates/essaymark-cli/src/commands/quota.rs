//! The `essaymark quota` command.

use std::path::PathBuf;

use anyhow::Result;

use essaymark_core::model::UserId;
use essaymark_core::traits::ResultRepository;

pub async fn execute(user: String, config_path: Option<PathBuf>) -> Result<()> {
    let repository = super::open_reader(config_path.as_deref())?;
    let user = UserId::new(user);
    let quota = repository.fetch_quota(&user).await?;
    println!("{user}: {} credits remaining", quota.remaining_credits);
    Ok(())
}
