use clap::Parser; // for cli
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

mod batch;
mod config;
mod error;
mod faker;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod store;

use config::Args;
use rate_limit::{FailPolicy, RateLimiter, RedisCounterStore, memory::sweeper};
use state::AppState;
use store::clickhouse::ClickHouseConfig;
use store::{ClickHouseStore, UserStore};

// how often idle local counters are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let store = ClickHouseStore::new(ClickHouseConfig {
        url: args.clickhouse_url.clone(),
        user: args.clickhouse_user.clone(),
        password: args.clickhouse_password.clone(),
        database: args.clickhouse_database.clone(),
        timeout: args.storage_timeout(),
        insert_format: args.insert_format,
    })?;

    // a failed schema check is logged, not fatal
    match store.ensure_schema().await {
        Ok(()) => info!("Table 'users' created or already exists."),
        Err(e) => error!("Error creating table 'users': {}", e),
    }

    // an unreachable Redis leaves the fail policy in charge until it answers
    let counters = RedisCounterStore::new(&args.redis_url)?;
    if let Err(e) = counters.warm_up().await {
        warn!(
            "Counter store at {} unavailable, starting anyway: {}",
            args.redis_url, e
        );
    }
    let rl_config = args.rate_limit_config();
    let limiter = Arc::new(RateLimiter::new(Arc::new(counters), rl_config.clone()));

    if rl_config.fail_policy == FailPolicy::Local {
        tokio::spawn(sweeper(limiter.fallback(), rl_config.window, SWEEP_INTERVAL));
    }

    let state = Arc::new(AppState {
        store: Arc::new(store),
        limiter,
        batch_size: args.batch_size,
        read_limit: args.read_limit,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server is running on http://localhost:{}", args.port);
    info!("ClickHouse at {} (database {})", args.clickhouse_url, args.clickhouse_database);
    info!("Counter store at {}", args.redis_url);
    info!(
        "Rate limit: {} requests per {} seconds, {:?} on store failure",
        rl_config.limit,
        rl_config.window.as_secs(),
        rl_config.fail_policy
    );
    info!(
        "Batch size: {} rows, {:?} encoding",
        args.batch_size, args.insert_format
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Error installing Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
