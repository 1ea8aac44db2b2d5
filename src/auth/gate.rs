use crate::models::User;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{detail}")]
pub struct ForbiddenError {
    pub detail: String,
}

/// Admin authorization checkpoint.
///
/// Role evaluation is not implemented yet: every authenticated user passes.
/// TODO: enforce the `roles` claim from the token (claims already carry it)
/// once role assignment exists in the provisioning flow.
pub fn authorize_admin(_user: &User) -> Result<(), ForbiddenError> {
    Ok(())
}
