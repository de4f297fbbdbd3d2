/**
 * Authentication
 * Password hashing for the admin credential and signed bearer tokens
 */
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::ApiError;
use crate::state::AppState;

/// bcrypt only looks at the first 72 bytes; longer inputs are cut here so
/// hashing and verification always see the same prefix.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub fn password_bytes(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password_bytes(password), cost)
}

/// Any malformed hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password_bytes(password), password_hash).unwrap_or(false)
}

/// JWT claims carried by an admin token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // admin username
    pub exp: i64,
    pub iat: i64,
}

/// Issues and validates admin bearer tokens.
pub struct TokenService {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.jwt_secret,
            settings.jwt_algorithm,
            Duration::hours(settings.jwt_expiration_hours),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_expiry(username, Utc::now() + self.ttl)
    }

    pub fn issue_with_expiry(
        &self,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: username.to_string(),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding)
    }

    /// Fails closed: bad signature, wrong algorithm, missing claims or an
    /// expiry in the past all reject the token.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Extract bearer token from Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticated administrator. Adding this extractor to a handler makes
/// the route admin-only.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub username: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(ApiError::Unauthorized("Not authenticated"))?;

        match state.tokens.verify(token) {
            Ok(claims) => Ok(AdminUser {
                username: claims.sub,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Err(ApiError::Unauthorized("Could not validate credentials"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> TokenService {
        TokenService::new("test-secret", Algorithm::HS256, Duration::hours(1))
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("s3cret!", 4).unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("s3cret?", &hash));
    }

    #[test]
    fn test_long_passwords_truncate_consistently() {
        let base = "x".repeat(MAX_PASSWORD_BYTES);
        let longer = format!("{}tail-that-is-ignored", base);
        let hash = hash_password(&longer, 4).unwrap();

        assert!(verify_password(&longer, &hash));
        assert!(verify_password(&base, &hash));
        assert!(!verify_password(&base[..MAX_PASSWORD_BYTES - 1], &hash));
    }

    #[test]
    fn test_verify_password_malformed_hash_is_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_token_roundtrip_carries_username() {
        let tokens = service();
        let token = tokens.issue("admin").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_with_expiry("admin", Utc::now() - Duration::seconds(5))
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = TokenService::new("other-secret", Algorithm::HS256, Duration::hours(1));
        let token = other.issue("admin").unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_token_with_other_algorithm_is_rejected() {
        let other = TokenService::new("test-secret", Algorithm::HS512, Duration::hours(1));
        let token = other.issue("admin").unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(service().verify("invalid.jwt.token").is_err());
        assert!(service().verify("").is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }
}
