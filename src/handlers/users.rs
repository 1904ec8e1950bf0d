use axum::{Json, extract::State, http::StatusCode};
use log::{error, info};
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::{REQUEST_TOTAL, ROWS_INSERTED};
use crate::models::{CreateUserRequest, Message, NewUser, User, UserCount};
use crate::state::AppState;

pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    REQUEST_TOTAL.inc();

    let row = NewUser::new(payload.name, payload.age);
    state
        .store
        .insert_users(std::slice::from_ref(&row))
        .await
        .map_err(|e| {
            error!("Error inserting user: {}", e);
            ApiError::Internal("Error creating user")
        })?;

    ROWS_INSERTED.inc();
    info!("[Users] created {}", row.id);
    Ok((StatusCode::CREATED, Json(Message::new("User created successfully"))))
}

// Newest first, capped at the configured read limit
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    REQUEST_TOTAL.inc();

    let users = state.store.recent_users(state.read_limit).await.map_err(|e| {
        error!("Error fetching users: {}", e);
        ApiError::Internal("Error fetching users")
    })?;
    Ok(Json(users))
}

pub async fn count_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserCount>, ApiError> {
    REQUEST_TOTAL.inc();

    let count = state.store.count_users().await.map_err(|e| {
        error!("Error fetching user count: {}", e);
        ApiError::Internal("Error fetching user count")
    })?;

    // zero rows is 404 as well as no row, unlike a plain `{userCount: 0}`
    match count {
        Some(n) if n > 0 => Ok(Json(UserCount { user_count: n })),
        _ => Err(ApiError::NotFound("No data found")),
    }
}
