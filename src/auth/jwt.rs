//! JWT Token Service
//!
//! Issues and validates the session tokens handed out after Google login.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const ISSUER: &str = "meal-planner";

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Internal user id
    pub sub: String,
    /// User email
    pub email: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service with the provided secret and token lifetime
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            ttl: Duration::try_hours(ttl_hours.max(1)).unwrap_or_else(|| Duration::days(7)),
        }
    }

    /// Seconds a freshly issued token stays valid
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Generate a session token for a user
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;
        self.encode_claims(&Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to encode JWT token: {e}")))
    }

    /// Validate a session token and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data: TokenData<Claims>| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let jwt_service = JwtService::new("test_secret", 24);

        let token = jwt_service.issue("user-1", "test@example.com").unwrap();
        let claims = jwt_service.validate(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_rejects_foreign_secret() {
        let issuer = JwtService::new("one", 24);
        let verifier = JwtService::new("two", 24);
        let token = issuer.issue("user-1", "a@example.com").unwrap();

        assert!(matches!(verifier.validate(&token), Err(AppError::Unauthorized(_))));
        assert!(verifier.validate("not-a-token").is_err());
    }

    #[test]
    fn test_huge_ttl_fails_instead_of_overflowing() {
        let service = JwtService::new("secret", 2_000_000_000_000);
        assert!(matches!(
            service.issue("user-1", "a@example.com"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = JwtService::new("secret", 24);
        let now = Utc::now();
        let token = service
            .encode_claims(&Claims {
                sub: "user-1".into(),
                email: "a@example.com".into(),
                iat: (now - Duration::hours(48)).timestamp(),
                exp: (now - Duration::hours(24)).timestamp(),
                iss: ISSUER.into(),
            })
            .unwrap();

        assert!(matches!(service.validate(&token), Err(AppError::Unauthorized(_))));
    }
}
