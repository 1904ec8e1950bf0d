// fixed-window limiter: counts up to `limit` per window pass, the store
// expires the key when the window ends

use async_trait::async_trait;
use clap::ValueEnum;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CounterError;
use crate::metrics::COUNTER_STORE_ERRORS;

pub mod memory;
pub mod middleware;
pub mod redis;

pub use memory::MemoryCounterStore;
pub use middleware::rate_limit_middleware;
pub use self::redis::RedisCounterStore;

pub const LIMITED_MESSAGE: &str = "Too many requests from this IP.";
pub const UNAVAILABLE_MESSAGE: &str = "Rate limiter unavailable.";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPolicy {
    // let the request through without quota headers
    Open,
    // answer 503
    Closed,
    // count in this process only
    Local,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub limit: u64,
    pub window: Duration,
    pub call_timeout: Duration,
    pub fail_policy: FailPolicy,
    pub trust_proxy: bool,
}

// Counter value right after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterHit {
    pub count: u64,
    pub reset_in: Duration,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    // atomic add-and-read; a key without expiry gets `window`
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterHit, CounterError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub limit: u64,
    pub count: u64,
    pub reset_in: Duration,
}

impl Decision {
    pub fn allowed(&self) -> bool {
        self.count <= self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }

    // Whole seconds until the window resets, rounded up
    pub fn reset_secs(&self) -> u64 {
        self.reset_in.as_millis().div_ceil(1000) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Decided(Decision),
    // store down, policy open
    Bypass,
    // store down, policy closed
    Unavailable,
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    fallback: Arc<MemoryCounterStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self {
            store,
            fallback: Arc::new(MemoryCounterStore::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    // Per-process counters used under FailPolicy::Local
    pub fn fallback(&self) -> Arc<MemoryCounterStore> {
        Arc::clone(&self.fallback)
    }

    pub async fn check(&self, key: &str) -> Verdict {
        match self.increment(key).await {
            Ok(hit) => Verdict::Decided(self.decision(hit)),
            Err(e) => {
                COUNTER_STORE_ERRORS.inc();
                warn!(
                    "[RateLimit] counter store failed for {} ({:?} policy): {}",
                    key, self.config.fail_policy, e
                );
                match self.config.fail_policy {
                    FailPolicy::Open => Verdict::Bypass,
                    FailPolicy::Closed => Verdict::Unavailable,
                    FailPolicy::Local => {
                        let hit = self.fallback.hit(key, self.config.window);
                        Verdict::Decided(self.decision(hit))
                    }
                }
            }
        }
    }

    async fn increment(&self, key: &str) -> Result<CounterHit, CounterError> {
        let call = self.store.increment(key, self.config.window);
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CounterError::Timeout(self.config.call_timeout)),
        }
    }

    fn decision(&self, hit: CounterHit) -> Decision {
        Decision {
            limit: self.config.limit,
            count: hit.count,
            reset_in: hit.reset_in,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub fn config(policy: FailPolicy) -> RateLimitConfig {
        RateLimitConfig {
            limit: 5,
            window: Duration::from_secs(900),
            call_timeout: Duration::from_millis(100),
            fail_policy: policy,
            trust_proxy: false,
        }
    }

    // Counter store whose every call fails
    pub struct DownStore {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl CounterStore for DownStore {
        async fn increment(&self, _key: &str, _window: Duration) -> Result<CounterHit, CounterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            Err(CounterError::Redis(io.into()))
        }
    }

    // Counter store that never answers
    struct HungStore;

    #[async_trait]
    impl CounterStore for HungStore {
        async fn increment(&self, _key: &str, _window: Duration) -> Result<CounterHit, CounterError> {
            std::future::pending().await
        }
    }

    fn down() -> Arc<DownStore> {
        Arc::new(DownStore {
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn decision_boundaries() {
        let at_limit = Decision {
            limit: 5,
            count: 5,
            reset_in: Duration::from_millis(1_001),
        };
        assert!(at_limit.allowed());
        assert_eq!(at_limit.remaining(), 0);
        assert_eq!(at_limit.reset_secs(), 2);

        let over = Decision { count: 6, ..at_limit };
        assert!(!over.allowed());
        assert_eq!(over.remaining(), 0);
    }

    #[tokio::test]
    async fn sixth_request_in_window_is_limited() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), config(FailPolicy::Closed));

        let mut allowed = 0;
        for _ in 0..6 {
            match limiter.check("10.0.0.1").await {
                Verdict::Decided(d) if d.allowed() => allowed += 1,
                Verdict::Decided(d) => assert_eq!(d.count, 6),
                other => panic!("unexpected verdict {:?}", other),
            }
        }
        assert_eq!(allowed, 5);

        // other clients have their own quota
        let Verdict::Decided(d) = limiter.check("10.0.0.2").await else {
            panic!("expected a decision");
        };
        assert_eq!(d.count, 1);
        assert_eq!(d.remaining(), 4);
    }

    #[tokio::test]
    async fn open_policy_bypasses() {
        let store = down();
        let limiter = RateLimiter::new(store.clone(), config(FailPolicy::Open));
        assert_eq!(limiter.check("a").await, Verdict::Bypass);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_policy_rejects() {
        let limiter = RateLimiter::new(down(), config(FailPolicy::Closed));
        assert_eq!(limiter.check("a").await, Verdict::Unavailable);
    }

    #[tokio::test]
    async fn local_policy_counts_in_process() {
        let limiter = RateLimiter::new(down(), config(FailPolicy::Local));
        for expected in 1..=6 {
            let Verdict::Decided(d) = limiter.check("a").await else {
                panic!("expected a decision");
            };
            assert_eq!(d.count, expected);
        }
        assert_eq!(limiter.fallback().len(), 1);
    }

    #[tokio::test]
    async fn hung_store_times_out() {
        let limiter = RateLimiter::new(Arc::new(HungStore), config(FailPolicy::Closed));
        assert_eq!(limiter.check("a").await, Verdict::Unavailable);
    }
}
