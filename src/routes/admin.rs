//! Admin API routes.
//!
//! Provides:
//! - Users list with active flags (`/users`)
//! - Enable/disable a user account (`/users/:id/enable`, `/users/:id/disable`)
//!
//! All routes sit behind the admin gate middleware.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::require_admin;
use crate::models::User;
use crate::AppState;

/// Response for /users endpoint.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub total: usize,
}

/// GET /users - List all users
async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, (StatusCode, String)> {
    let users = state
        .users
        .list_users()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let total = users.len();
    Ok(Json(UsersResponse { users, total }))
}

/// POST /users/:id/disable - Block a user from authenticating
async fn disable_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    set_active(&state, &user_id, false)
}

/// POST /users/:id/enable - Re-enable a blocked user
async fn enable_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    set_active(&state, &user_id, true)
}

fn set_active(
    state: &AppState,
    user_id: &str,
    is_active: bool,
) -> Result<StatusCode, (StatusCode, String)> {
    let id = Uuid::parse_str(user_id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid user id".to_string()))?;

    let changed = state
        .users
        .set_user_active(id, is_active)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if changed {
        tracing::info!(user_id = %id, is_active, "updated user active flag");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "user not found".to_string()))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/disable", post(disable_user))
        .route("/users/:id/enable", post(enable_user))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
