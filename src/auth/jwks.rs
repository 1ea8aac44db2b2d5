use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Verified token payload.
///
/// `sub` and `email` stay optional here: their absence is a business-level
/// rejection with a specific message, owned by the identity resolver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Per-app roles from the OIDC provider.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub aud: serde_json::Value,
    pub exp: u64,
    pub iat: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("JWKS fetch error: {0}")]
    JwksFetch(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
}

/// JWKS key set response.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[allow(dead_code)]
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OidcConfig {
    jwks_uri: String,
}

/// Verifies bearer tokens against the issuer's JWKS, caching keys by kid.
pub struct JwksVerifier {
    http_client: Client,
    jwks_uri: String,
    keys: Arc<RwLock<HashMap<String, DecodingKey>>>,
    issuer: String,
}

impl JwksVerifier {
    pub async fn new(issuer: &str) -> Result<Self, AuthError> {
        let http_client = Client::new();

        // Fetch OIDC configuration to get JWKS URI
        let config_url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );
        let config: OidcConfig = http_client
            .get(&config_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?;

        let verifier = Self {
            http_client,
            jwks_uri: config.jwks_uri,
            keys: Arc::new(RwLock::new(HashMap::new())),
            issuer: issuer.to_string(),
        };

        // Fetch keys initially
        verifier.refresh_keys().await?;

        Ok(verifier)
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();

        for jwk in response.keys {
            if jwk.kty == "RSA" {
                if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            keys.insert(jwk.kid.clone(), key);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", keys.len());
        Ok(())
    }

    /// Extract and verify the bearer token from the request headers.
    pub async fn verify_bearer(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let auth_header = headers
            .get("authorization")
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        self.verify_token(token).await
    }

    /// Verify a raw token string and return its claims.
    pub async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Missing kid in token header".to_string()))?;

        // Unknown kid may mean the issuer rotated keys since startup; refresh once.
        if !self.keys.read().await.contains_key(&kid) {
            self.refresh_keys().await?;
        }

        let keys = self.keys.read().await;
        let key = keys.get(&kid).ok_or_else(|| AuthError::KeyNotFound(kid.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        // Skip audience validation for now (can be added later)
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn test_claims_deserialize_full() {
        let json = r#"{
            "sub": "5f6b0f52-0000-4000-8000-000000000001",
            "email": "user@example.com",
            "roles": ["admin"],
            "aud": "app",
            "exp": 2000000000,
            "iat": 1000000000
        }"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("5f6b0f52-0000-4000-8000-000000000001"));
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
        assert_eq!(claims.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_claims_deserialize_missing_sub_and_email() {
        let json = r#"{"exp": 2000000000, "iat": 1000000000}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.sub.is_none());
        assert!(claims.email.is_none());
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_bearer_prefix_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(value.strip_prefix("Bearer ").is_none());
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthError::MissingHeader.to_string(),
            "Missing Authorization header"
        );
        assert_eq!(
            AuthError::InvalidFormat.to_string(),
            "Invalid Authorization header format"
        );
        assert!(AuthError::InvalidToken("bad".into())
            .to_string()
            .contains("Invalid token"));
        assert!(AuthError::KeyNotFound("kid1".into())
            .to_string()
            .contains("kid1"));
    }
}
