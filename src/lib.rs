pub mod auth;
pub mod config;
pub mod logging;
pub mod models;
pub mod routes;
pub mod store;
pub mod test_util;

pub use auth::{Claims, IdentityResolver, JwksVerifier, UnauthorizedError};
pub use config::Config;
pub use models::User;
pub use store::{SqliteUserStore, UserRepository};

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub jwks: JwksVerifier,
    pub users: Arc<SqliteUserStore>,
    pub resolver: IdentityResolver<SqliteUserStore>,
}
