use ::redis::Script;
use ::redis::aio::{ConnectionManager, ConnectionManagerConfig};
use async_trait::async_trait;
use log::{info, warn};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{CounterHit, CounterStore};
use crate::error::CounterError;

pub const KEY_PREFIX: &str = "rl:";

// bounded connect so a dead Redis can't stall startup or a request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_RETRIES: usize = 1;
// min gap between reconnect attempts while disconnected
const RECONNECT_EVERY: Duration = Duration::from_secs(5);

// INCR and expiry in one server-side step. PTTL is -1 when the key has no
// expiry; only then is the window armed.
const INCREMENT_SCRIPT: &str = r#"
local hits = redis.call("INCR", KEYS[1])
local ttl = redis.call("PTTL", KEYS[1])
if ttl < 0 then
  redis.call("PEXPIRE", KEYS[1], tonumber(ARGV[1]))
  ttl = tonumber(ARGV[1])
end
return { hits, ttl }
"#;

// Connection slot: `conn` stays None until Redis answers
struct Link {
    conn: Option<ConnectionManager>,
    last_attempt: Option<Instant>,
}

pub struct RedisCounterStore {
    client: ::redis::Client,
    link: Mutex<Link>,
    script: Script,
}

impl RedisCounterStore {
    // Only a malformed URL fails here; connecting happens on first use
    pub fn new(url: &str) -> Result<Self, CounterError> {
        let client = ::redis::Client::open(url)?;
        Ok(Self {
            client,
            link: Mutex::new(Link {
                conn: None,
                last_attempt: None,
            }),
            script: Script::new(INCREMENT_SCRIPT),
        })
    }

    // Try to connect now; the store stays usable either way
    pub async fn warm_up(&self) -> Result<(), CounterError> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&self) -> Result<ConnectionManager, CounterError> {
        let mut link = self.link.lock().await;
        if let Some(conn) = &link.conn {
            return Ok(conn.clone());
        }

        if let Some(at) = link.last_attempt {
            if at.elapsed() < RECONNECT_EVERY {
                return Err(CounterError::Disconnected);
            }
        }
        link.last_attempt = Some(Instant::now());

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(CONNECT_TIMEOUT)
            .set_number_of_retries(CONNECT_RETRIES);
        match ConnectionManager::new_with_config(self.client.clone(), config).await {
            Ok(conn) => {
                info!("[RateLimit] connected to counter store");
                link.conn = Some(conn.clone());
                Ok(conn)
            }
            Err(e) => {
                warn!("[RateLimit] counter store unreachable: {}", e);
                Err(e.into())
            }
        }
    }
}

pub fn counter_key(client: &str) -> String {
    format!("{}{}", KEY_PREFIX, client)
}

// `{hits, ttl_ms}` from the increment script
pub fn hit_from_reply((hits, ttl_ms): (u64, i64)) -> CounterHit {
    CounterHit {
        count: hits,
        reset_in: Duration::from_millis(ttl_ms.max(0) as u64),
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterHit, CounterError> {
        let mut conn = self.connection().await?;
        let mut invocation = self.script.prepare_invoke();
        invocation
            .key(counter_key(key))
            .arg(window.as_millis() as u64);

        let reply: (u64, i64) = invocation.invoke_async(&mut conn).await?;
        Ok(hit_from_reply(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        assert_eq!(counter_key("203.0.113.9"), "rl:203.0.113.9");
        assert_eq!(counter_key("::1"), "rl:::1");
    }

    #[test]
    fn malformed_url_is_rejected() {
        let result = RedisCounterStore::new("not-a-redis-url");
        assert!(matches!(result, Err(CounterError::Redis(_))));
    }

    #[test]
    fn reply_maps_to_hit() {
        assert_eq!(
            hit_from_reply((3, 899_500)),
            CounterHit {
                count: 3,
                reset_in: Duration::from_millis(899_500),
            }
        );
        // a key on the edge of expiry reports zero, never negative
        assert_eq!(hit_from_reply((6, 0)).reset_in, Duration::ZERO);
        assert_eq!(hit_from_reply((1, -1)).reset_in, Duration::ZERO);
    }

    #[test]
    fn script_arms_expiry_only_without_ttl() {
        assert!(INCREMENT_SCRIPT.contains("if ttl < 0 then"));
        assert!(!INCREMENT_SCRIPT.contains("ttl <= 0"));
        assert!(INCREMENT_SCRIPT.contains("return { hits, ttl }"));
    }

    #[tokio::test]
    async fn unreachable_redis_fails_fast_then_backs_off() {
        let store = RedisCounterStore::new("redis://127.0.0.1:1").unwrap();

        let started = Instant::now();
        let first = store.increment("a", Duration::from_secs(900)).await;
        assert!(matches!(first, Err(CounterError::Redis(_))));
        assert!(started.elapsed() < Duration::from_secs(30));

        // inside the reconnect gap no connection is attempted
        let second = store.increment("a", Duration::from_secs(900)).await;
        assert!(matches!(second, Err(CounterError::Disconnected)));
    }
}
