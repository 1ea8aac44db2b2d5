use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::gate;
use crate::models::User;
use crate::AppState;

/// Verify the bearer token and resolve the user record.
///
/// Every failure maps to 401 with the error detail as body; a database
/// conflict during provisioning never surfaces as a 500.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, Response> {
    let claims = state.jwks.verify_bearer(headers).await.map_err(|e| {
        tracing::warn!(error = %e, "token verification failed");
        (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
    })?;

    state.resolver.resolve(&claims).map_err(|e| {
        tracing::warn!(error = %e, "identity resolution failed");
        (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
    })
}

/// Middleware that authenticates the request and stores the resolved user in
/// the request extensions for downstream handlers.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match authenticate(&state, request.headers()).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Middleware for admin routes: authenticate, then pass the gate.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match authenticate(&state, request.headers()).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if let Err(e) = gate::authorize_admin(&user) {
        return (StatusCode::FORBIDDEN, e.to_string()).into_response();
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}
