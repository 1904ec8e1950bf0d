use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

use super::{Decision, LIMITED_MESSAGE, RateLimiter, UNAVAILABLE_MESSAGE, Verdict};
use crate::metrics::RATE_LIMITED;

// Client key: socket address, or the first X-Forwarded-For hop behind a proxy
pub fn client_key(req: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// Standard `RateLimit-*` fields; no `X-RateLimit-*` variants
pub fn apply_headers(headers: &mut HeaderMap, decision: &Decision, window_secs: u64) {
    let policy = format!("{};w={}", decision.limit, window_secs);
    if let Ok(v) = HeaderValue::from_str(&policy) {
        headers.insert("ratelimit-policy", v);
    }
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining()));
    headers.insert("ratelimit-reset", HeaderValue::from(decision.reset_secs()));
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let config = limiter.config();
    let key = client_key(&req, config.trust_proxy);
    let window_secs = config.window.as_secs();

    let decision = match limiter.check(&key).await {
        Verdict::Decided(d) => d,
        Verdict::Bypass => return next.run(req).await,
        Verdict::Unavailable => {
            return (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE).into_response();
        }
    };

    if !decision.allowed() {
        RATE_LIMITED.inc();
        info!("[RateLimit] {} over quota ({} in window)", key, decision.count);

        let mut res = (StatusCode::TOO_MANY_REQUESTS, LIMITED_MESSAGE).into_response();
        apply_headers(res.headers_mut(), &decision, window_secs);
        res.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_secs()));
        return res;
    }

    let mut res = next.run(req).await;
    apply_headers(res.headers_mut(), &decision, window_secs);
    res
}
