//! essaymark-store: History store implementations.
//!
//! Implements the `HistoryStore` trait with an in-memory store (tests and
//! offline demos) and a JSON-file store for local persistence.
//!
//! Both stores keep the same credit bookkeeping: a user starts with
//! `initial_credits`, each append spends one (saturating at 0), and the
//! balance is topped back up to `initial_credits` once more than
//! [`CREDIT_REFILL_HOURS`] have passed since the last top-up.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Credits a user starts with before their first submission.
pub const DEFAULT_INITIAL_CREDITS: u32 = 2;

/// Hours after the last top-up before a balance is refilled.
pub const CREDIT_REFILL_HOURS: i64 = 24;

/// Source of the current time for credit refills.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub(crate) fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

pub(crate) fn refill_due(last_update: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_update > Duration::hours(CREDIT_REFILL_HOURS)
}

#[cfg(test)]
pub(crate) mod test_clock {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::Clock;

    /// A clock that only moves when told to.
    #[derive(Clone)]
    pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        pub fn new() -> Self {
            Self(Arc::new(Mutex::new(
                Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            )))
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }

        pub fn clock(&self) -> Clock {
            let inner = Arc::clone(&self.0);
            Arc::new(move || *inner.lock().unwrap())
        }
    }
}
