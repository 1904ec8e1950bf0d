use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("users_requests_total", "Total number of requests").unwrap();
    pub static ref ROWS_INSERTED: Counter =
        register_counter!("users_rows_inserted_total", "Total user rows written").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("users_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref COUNTER_STORE_ERRORS: Counter = register_counter!(
        "users_counter_store_errors_total",
        "Failed or timed out counter store calls"
    )
    .unwrap();
    pub static ref BATCH_LATENCY: Histogram = register_histogram!(
        "users_batch_insert_seconds",
        "Latency of one bulk insert statement in seconds"
    )
    .unwrap();
}
