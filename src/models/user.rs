use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Sentinel stored instead of a password hash for accounts provisioned from
/// an external identity provider. No local login is possible with it.
pub const EXTERNAL_CREDENTIAL_MARKER: &str = "external_oauth";

/// User record created on first successful authentication.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// User ID; equals the token `sub` claim for auto-provisioned accounts.
    pub id: Uuid,
    /// Email from the token, unique.
    pub email: String,
    /// Derived login name, unique: email local part plus a random suffix.
    pub username: String,
    /// Human-readable name, defaults to the email local part.
    pub display_name: String,
    /// Opaque credential. Not serialized in API responses.
    #[serde(skip_serializing)]
    pub credential_marker: String,
    /// Whether the user is allowed to make requests.
    pub is_active: bool,
    /// When the user first authenticated.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            username: "alice_1a2b3c4d".to_string(),
            display_name: "alice".to_string(),
            credential_marker: EXTERNAL_CREDENTIAL_MARKER.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_credential_marker_not_serialized() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("credential_marker"));
        assert!(!json.contains(EXTERNAL_CREDENTIAL_MARKER));
    }

    #[test]
    fn test_user_serializes_public_fields() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(json.contains("alice_1a2b3c4d"));
        assert!(json.contains(r#""is_active":true"#));
    }
}
