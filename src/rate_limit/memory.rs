use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use super::{CounterHit, CounterStore};
use crate::error::CounterError;

// Rate limit entry - tracks requests per client key
pub struct RateLimitEntry {
    pub count: u64,
    pub window_start: Instant,
}

// Fixed-window counters local to this process
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self, key: &str, window: Duration) -> CounterHit {
        let now = Instant::now();

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        // window expired..? start a new one
        if entry.window_start.elapsed() >= window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count += 1;

        CounterHit {
            count: entry.count,
            reset_in: window.saturating_sub(entry.window_start.elapsed()),
        }
    }

    // Drop every entry whose window has elapsed
    pub fn purge_expired(&self, window: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.window_start.elapsed() < window);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterHit, CounterError> {
        Ok(self.hit(key, window))
    }
}

// Expire local counters on a timer so idle clients don't pile up
pub async fn sweeper(store: Arc<MemoryCounterStore>, window: Duration, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;
        let dropped = store.purge_expired(window);
        if dropped > 0 {
            debug!(
                "[RateLimit] dropped {} expired local counters, {} live",
                dropped,
                store.len()
            );
        }
    }
}
