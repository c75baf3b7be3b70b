//! Per-provider request rate tracking.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::debug;

use super::catalog::RateLimit;

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Usage {
    recent: VecDeque<Instant>,
    day: NaiveDate,
    day_count: u32,
}

impl Usage {
    fn new(today: NaiveDate) -> Self {
        Self {
            recent: VecDeque::new(),
            day: today,
            day_count: 0,
        }
    }
}

/// Sliding one-minute window plus a per-day counter for each provider.
///
/// The lock is only held for bookkeeping, never across an await point.
#[derive(Debug, Default)]
pub struct RateTracker {
    usage: Mutex<HashMap<String, Usage>>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `provider` if its limits allow one now.
    pub fn try_acquire(&self, provider: &str, limit: &RateLimit) -> bool {
        self.try_acquire_at(provider, limit, Instant::now(), Local::now().date_naive())
    }

    /// [`try_acquire`](Self::try_acquire) with an explicit clock.
    pub fn try_acquire_at(
        &self,
        provider: &str,
        limit: &RateLimit,
        now: Instant,
        today: NaiveDate,
    ) -> bool {
        if limit.per_minute.is_none() && limit.per_day.is_none() {
            return true;
        }

        let mut usage = self.usage.lock().unwrap_or_else(|e| e.into_inner());
        let entry = usage
            .entry(provider.to_string())
            .or_insert_with(|| Usage::new(today));

        if entry.day != today {
            entry.day = today;
            entry.day_count = 0;
        }
        while entry
            .recent
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= WINDOW)
        {
            entry.recent.pop_front();
        }

        if limit.per_minute.is_some_and(|max| entry.recent.len() >= max as usize)
            || limit.per_day.is_some_and(|max| entry.day_count >= max)
        {
            debug!("Provider '{}' is at its rate limit", provider);
            return false;
        }

        entry.recent.push_back(now);
        entry.day_count += 1;
        true
    }
}
