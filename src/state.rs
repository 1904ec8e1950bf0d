use std::sync::Arc;

use crate::rate_limit::RateLimiter;
use crate::store::UserStore;

// app's shared state
pub struct AppState {
    pub store: Arc<dyn UserStore>, // one long-lived ClickHouse client
    pub limiter: Arc<RateLimiter>, // one long-lived Redis connection
    pub batch_size: usize,         // rows per POST /users1
    pub read_limit: u32,           // max rows per GET /users
}
