use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum StorageError {
    Transport(reqwest::Error),
    // non-2xx from the server
    Rejected { status: u16, body: String },
    Decode(String),
    // bad endpoint, caught at startup
    Config(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Transport(e) => write!(f, "transport error: {}", e),
            StorageError::Rejected { status, body } => {
                write!(f, "rejected with status {}: {}", status, body.trim())
            }
            StorageError::Decode(s) => write!(f, "decode error: {}", s),
            StorageError::Config(s) => write!(f, "invalid storage config: {}", s),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        StorageError::Transport(error)
    }
}

#[derive(Debug)]
pub enum CounterError {
    Redis(redis::RedisError),
    Timeout(Duration),
    // waiting out the reconnect gap
    Disconnected,
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterError::Redis(e) => write!(f, "redis error: {}", e),
            CounterError::Timeout(d) => write!(f, "counter store timed out after {:?}", d),
            CounterError::Disconnected => write!(f, "counter store not connected"),
        }
    }
}

impl std::error::Error for CounterError {}

impl From<redis::RedisError> for CounterError {
    fn from(error: redis::RedisError) -> Self {
        CounterError::Redis(error)
    }
}

// what the client sees, detail stays in the log
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    Internal(&'static str),
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
