pub mod sqlite;

pub use sqlite::SqliteUserStore;

use uuid::Uuid;

use crate::models::User;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    /// Unique constraint violation, e.g. two requests racing to provision
    /// the same user.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Fields needed to insert a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub credential_marker: String,
}

/// Read/write access to user records as consumed by the identity resolver.
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;
}
