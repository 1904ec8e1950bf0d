mod bulk;
mod health;
mod metrics;
mod users;

pub use bulk::create_batch_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use users::{count_users_handler, create_user_handler, list_users_handler};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;

use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

// Only the read endpoints sit behind the limiter; both share one counter
// per client.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = from_fn_with_state(state.limiter.clone(), rate_limit_middleware);

    Router::new()
        .route(
            "/users",
            post(create_user_handler).merge(get(list_users_handler).route_layer(limit.clone())),
        )
        .route("/users1", post(create_batch_handler))
        .route("/users/count", get(count_users_handler).route_layer(limit))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
