use std::sync::Arc;

use uuid::Uuid;

use crate::auth::jwks::Claims;
use crate::models::user::{User, EXTERNAL_CREDENTIAL_MARKER};
use crate::store::{NewUser, StoreError, UserRepository};

/// The only failure kind this flow exposes. Maps to HTTP 401; lower-layer
/// errors are wrapped into the detail string and never propagate raw.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{detail}")]
pub struct UnauthorizedError {
    pub detail: String,
}

impl UnauthorizedError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Resolves verified claims to a user record, provisioning one on first
/// authentication.
pub struct IdentityResolver<R: UserRepository> {
    repo: Arc<R>,
}

impl<R: UserRepository> IdentityResolver<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Resolve the authenticated user for `claims`.
    ///
    /// Lookup order is id, then email; a user found by email is returned
    /// even when its stored id differs from the token sub. When neither
    /// lookup matches, a new user is created with the token sub as its id.
    pub fn resolve(&self, claims: &Claims) -> Result<User, UnauthorizedError> {
        let sub = claims
            .sub
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| UnauthorizedError::new("Invalid token: no sub"))?;

        let user_id = Uuid::parse_str(sub)
            .map_err(|e| UnauthorizedError::new(format!("Invalid token: malformed sub: {}", e)))?;

        if let Some(user) = self.repo.get_user_by_id(user_id).map_err(lookup_failed)? {
            return require_active(user);
        }

        let email = claims
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| UnauthorizedError::new("Invalid token: missing email"))?;

        if let Some(user) = self.repo.get_user_by_email(email).map_err(lookup_failed)? {
            if user.id != user_id {
                // Stored id differs from the token sub; keep the stored
                // record as-is rather than reconciling.
                tracing::warn!(
                    token_sub = %user_id,
                    stored_id = %user.id,
                    "resolved user by email with mismatched id"
                );
            }
            return require_active(user);
        }

        self.provision(user_id, email)
    }

    fn provision(&self, user_id: Uuid, email: &str) -> Result<User, UnauthorizedError> {
        let local_part = email.split('@').next().unwrap_or(email);
        let username = format!("{}_{}", local_part, hex::encode(rand::random::<[u8; 4]>()));

        let new_user = NewUser {
            id: user_id,
            email: email.to_string(),
            username,
            display_name: local_part.to_string(),
            credential_marker: EXTERNAL_CREDENTIAL_MARKER.to_string(),
        };

        match self.repo.create_user(new_user) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %user.email, "provisioned user");
                require_active(user)
            }
            Err(StoreError::Conflict(detail)) => {
                // Lost a provisioning race; the winning insert should now be
                // visible through the same lookups.
                tracing::debug!(user_id = %user_id, "provisioning conflict, retrying lookups");

                if let Some(user) = self.repo.get_user_by_id(user_id).map_err(lookup_failed)? {
                    return require_active(user);
                }
                if let Some(user) = self.repo.get_user_by_email(email).map_err(lookup_failed)? {
                    return require_active(user);
                }

                Err(UnauthorizedError::new(format!(
                    "Could not provision user: {}",
                    detail
                )))
            }
            Err(e) => Err(UnauthorizedError::new(format!(
                "Could not provision user: {}",
                e
            ))),
        }
    }
}

fn require_active(user: User) -> Result<User, UnauthorizedError> {
    if user.is_active {
        Ok(user)
    } else {
        Err(UnauthorizedError::new("User account is inactive"))
    }
}

fn lookup_failed(e: StoreError) -> UnauthorizedError {
    UnauthorizedError::new(format!("User lookup failed: {}", e))
}
