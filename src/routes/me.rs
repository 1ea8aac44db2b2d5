use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};

use crate::auth::middleware::require_user;
use crate::models::User;
use crate::AppState;

/// GET /me - The authenticated user, as resolved by the auth middleware.
async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(me))
        .layer(middleware::from_fn_with_state(state, require_user))
}
