//! JSON-file history store.
//!
//! Layout under the store directory:
//! - `history.json`: every entry, tagged with its owner
//! - `users.json`: per-user credit balance, first-seen time and last top-up
//!
//! Files are rewritten atomically (write to a temp file, then rename). A
//! missing file reads as empty. An append that cannot write `users.json`
//! puts the previous `history.json` back before reporting the error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use essaymark_core::model::{sort_most_recent_first, HistoryEntry, HistoryId, UserId, UserQuota};
use essaymark_core::traits::HistoryStore;

use crate::{refill_due, system_clock, Clock, DEFAULT_INITIAL_CREDITS};

const HISTORY_FILE: &str = "history.json";
const USERS_FILE: &str = "users.json";

/// A history store persisted as JSON files in one directory.
pub struct JsonFileStore {
    dir: PathBuf,
    initial_credits: u32,
    clock: Clock,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    user: UserId,
    entry: HistoryEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    credits: u32,
    created_at: DateTime<Utc>,
    // Absent in files written before refills existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_credit_update: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn new(credits: u32, now: DateTime<Utc>) -> Self {
        Self {
            credits,
            created_at: now,
            last_credit_update: Some(now),
        }
    }

    /// Top the balance back up to `initial` if the last top-up is over a
    /// day old. Returns whether a refill happened.
    fn refill(&mut self, initial: u32, now: DateTime<Utc>) -> bool {
        let last = self.last_credit_update.unwrap_or(self.created_at);
        if !refill_due(last, now) {
            return false;
        }
        self.credits = initial;
        self.last_credit_update = Some(now);
        true
    }
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_initial_credits(dir, DEFAULT_INITIAL_CREDITS)
    }

    pub fn with_initial_credits(dir: impl Into<PathBuf>, initial_credits: u32) -> Self {
        Self {
            dir: dir.into(),
            initial_credits,
            clock: system_clock(),
            lock: Mutex::new(()),
        }
    }

    /// Replace the time source used for daily credit refills.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load_entries(&self) -> Result<Vec<StoredEntry>> {
        read_json_or_default(&self.dir.join(HISTORY_FILE)).await
    }

    async fn load_users(&self) -> Result<BTreeMap<UserId, UserRecord>> {
        read_json_or_default(&self.dir.join(USERS_FILE)).await
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn append(&self, user: &UserId, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load_entries().await?;
        if entries.iter().any(|stored| stored.entry.id() == entry.id()) {
            anyhow::bail!("history entry {} already exists", entry.id());
        }
        entries.push(StoredEntry {
            user: user.clone(),
            entry: entry.clone(),
        });

        let mut users = self.load_users().await?;
        let now = (self.clock)();
        let record = users
            .entry(user.clone())
            .or_insert_with(|| UserRecord::new(self.initial_credits, now));
        record.refill(self.initial_credits, now);
        record.credits = record.credits.saturating_sub(1);

        let history_path = self.dir.join(HISTORY_FILE);
        write_json_atomic(&history_path, &entries).await?;
        if let Err(e) = write_json_atomic(&self.dir.join(USERS_FILE), &users).await {
            entries.pop();
            if let Err(restore) = write_json_atomic(&history_path, &entries).await {
                warn!(id = %entry.id(), error = %restore, "failed to roll back history entry");
            }
            return Err(e);
        }

        debug!(id = %entry.id(), user = %user, "appended history entry");
        Ok(())
    }

    async fn list(&self, user: &UserId) -> Result<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        let mut entries: Vec<HistoryEntry> = self
            .load_entries()
            .await?
            .into_iter()
            .filter(|stored| &stored.user == user)
            .map(|stored| stored.entry)
            .collect();
        sort_most_recent_first(&mut entries);
        Ok(entries)
    }

    async fn get(&self, id: HistoryId) -> Result<Option<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load_entries()
            .await?
            .into_iter()
            .find(|stored| stored.entry.id() == id)
            .map(|stored| stored.entry))
    }

    async fn quota(&self, user: &UserId) -> Result<UserQuota> {
        let _guard = self.lock.lock().await;
        let mut users = self.load_users().await?;
        let Some(record) = users.get_mut(user) else {
            return Ok(UserQuota {
                remaining_credits: self.initial_credits,
            });
        };
        if record.refill(self.initial_credits, (self.clock)()) {
            let remaining_credits = record.credits;
            write_json_atomic(&self.dir.join(USERS_FILE), &users).await?;
            debug!(user = %user, credits = remaining_credits, "refilled credits");
            return Ok(UserQuota { remaining_credits });
        }
        Ok(UserQuota {
            remaining_credits: record.credits,
        })
    }
}

async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
