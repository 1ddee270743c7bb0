//! In-memory history store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use essaymark_core::model::{sort_most_recent_first, HistoryEntry, HistoryId, UserId, UserQuota};
use essaymark_core::traits::HistoryStore;

use crate::{refill_due, system_clock, Clock, DEFAULT_INITIAL_CREDITS};

/// A history store that keeps everything in process memory.
///
/// Each append spends one credit from the owner's allowance. Credits are
/// bookkeeping only; the store never refuses an append.
pub struct MemoryStore {
    initial_credits: u32,
    clock: Clock,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    entries: Vec<(UserId, HistoryEntry)>,
    credits: HashMap<UserId, CreditBalance>,
}

#[derive(Debug, Clone, Copy)]
struct CreditBalance {
    credits: u32,
    last_credit_update: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_initial_credits(DEFAULT_INITIAL_CREDITS)
    }

    pub fn with_initial_credits(initial_credits: u32) -> Self {
        Self {
            initial_credits,
            clock: system_clock(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Replace the time source used for daily credit refills.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the store with existing entries for `user`, keeping their stored
    /// scores untouched. Seeding does not spend credits.
    pub fn seeded(user: &UserId, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state
                .entries
                .extend(entries.into_iter().map(|e| (user.clone(), e)));
        }
        store
    }

    /// Total number of entries across all users.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, user: &UserId, entry: &HistoryEntry) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.entries.iter().any(|(_, e)| e.id() == entry.id()) {
            anyhow::bail!("history entry {} already exists", entry.id());
        }
        state.entries.push((user.clone(), entry.clone()));

        let now = (self.clock)();
        let initial = self.initial_credits;
        let balance = state.credits.entry(user.clone()).or_insert(CreditBalance {
            credits: initial,
            last_credit_update: now,
        });
        if refill_due(balance.last_credit_update, now) {
            balance.credits = initial;
            balance.last_credit_update = now;
        }
        balance.credits = balance.credits.saturating_sub(1);
        Ok(())
    }

    async fn list(&self, user: &UserId) -> anyhow::Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .lock()
            .entries
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, e)| e.clone())
            .collect();
        sort_most_recent_first(&mut entries);
        Ok(entries)
    }

    async fn get(&self, id: HistoryId) -> anyhow::Result<Option<HistoryEntry>> {
        Ok(self
            .lock()
            .entries
            .iter()
            .find(|(_, e)| e.id() == id)
            .map(|(_, e)| e.clone()))
    }

    async fn quota(&self, user: &UserId) -> anyhow::Result<UserQuota> {
        let now = (self.clock)();
        let mut state = self.lock();
        let remaining_credits = match state.credits.get_mut(user) {
            Some(balance) => {
                if refill_due(balance.last_credit_update, now) {
                    balance.credits = self.initial_credits;
                    balance.last_credit_update = now;
                }
                balance.credits
            }
            None => self.initial_credits,
        };
        Ok(UserQuota { remaining_credits })
    }
}
