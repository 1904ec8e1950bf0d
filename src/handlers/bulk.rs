use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use crate::batch::{DEFAULT_BATCH_SIZE, ingest_batch};
use crate::error::ApiError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::Message;
use crate::state::AppState;

// Generate and insert a full synthetic batch in one statement
pub async fn create_batch_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    REQUEST_TOTAL.inc();

    // failure is already logged by ingest_batch
    ingest_batch(state.store.as_ref(), state.batch_size)
        .await
        .map_err(|_| ApiError::Internal("Error "))?;

    Ok((StatusCode::CREATED, Json(Message::new(&batch_message(state.batch_size)))))
}

// the 10K wording is only true at the default size
fn batch_message(size: usize) -> String {
    if size == DEFAULT_BATCH_SIZE {
        "inserted successfully by batching 10K !".to_string()
    } else {
        format!("inserted successfully by batching {} !", size)
    }
}
