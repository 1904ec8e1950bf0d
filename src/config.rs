use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::rate_limit::{FailPolicy, RateLimitConfig};

// How batch rows are encoded into the single insert statement
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertFormat {
    // rows sent as JSON lines, no string interpolation
    JsonEachRow,
    // one escaped VALUES list
    Values,
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "users-ingest-gateway")]
#[command(about = "User records over ClickHouse with a Redis-backed rate limiter")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8011)]
    pub port: u16,

    // ClickHouse HTTP interface
    #[arg(long, env = "CLICKHOUSE_URL", default_value = "http://localhost:8123")]
    pub clickhouse_url: String,

    #[arg(long, env = "CLICKHOUSE_USER", default_value = "default")]
    pub clickhouse_user: String,

    #[arg(long, env = "CLICKHOUSE_PASSWORD", default_value = "")]
    pub clickhouse_password: String,

    #[arg(long, env = "CLICKHOUSE_DATABASE", default_value = "default")]
    pub clickhouse_database: String,

    // Shared counter store for the rate limiter
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    // Rows generated per POST /users1
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    // Max rows returned by GET /users
    #[arg(long, default_value_t = 100)]
    pub read_limit: u32,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 5)]
    pub rate_limit: u64,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 900)]
    pub rate_window: u64,

    // Per-call timeout for ClickHouse, seconds
    #[arg(long, default_value_t = 30)]
    pub storage_timeout: u64,

    // Per-call timeout for Redis, milliseconds
    #[arg(long, default_value_t = 500)]
    pub counter_timeout: u64,

    // What the limiter does when Redis is unreachable
    #[arg(long, value_enum, default_value_t = FailPolicy::Local)]
    pub counter_fail_policy: FailPolicy,

    #[arg(long, value_enum, default_value_t = InsertFormat::JsonEachRow)]
    pub insert_format: InsertFormat,

    // Key clients by the first X-Forwarded-For entry
    #[arg(long, default_value_t = false)]
    pub trust_proxy: bool,
}

impl Args {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            limit: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
            call_timeout: Duration::from_millis(self.counter_timeout),
            fail_policy: self.counter_fail_policy,
            trust_proxy: self.trust_proxy,
        }
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout)
    }
}
