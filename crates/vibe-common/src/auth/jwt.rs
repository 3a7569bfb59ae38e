//! Access-token validation
//!
//! The identity provider signs HS256 tokens whose `sub` is the user's UUID and
//! whose `aud` is the authenticated-role audience. This service only checks
//! them; minting exists for tooling and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use vibe_core::UserId;

use crate::error::AppError;

/// Claims carried by an identity-provider access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// # Errors
    /// Returns an error if the subject is not a UUID
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
    access_token_expiry: i64,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, audience: impl Into<String>, access_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
            access_token_expiry,
        }
    }

    /// Mint an access token for `user_id`
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_access_token(&self, user_id: UserId) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            role: Some(self.audience.clone()),
            email: None,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    /// Decode and validate an access token
    ///
    /// # Errors
    /// Returns an error if the token is malformed, expired, for another audience,
    /// or names a subject that is not a user id
    pub fn validate_access_token(&self, token: &str) -> Result<(UserId, Claims), AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })?
            .claims;

        let user_id = claims.user_id()?;
        Ok((user_id, claims))
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("audience", &self.audience)
            .field("access_token_expiry", &self.access_token_expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough", "authenticated", 900)
    }

    #[test]
    fn test_issue_then_validate() {
        let service = service();
        let user = UserId::random();

        let token = service.issue_access_token(user).unwrap();
        let (user_id, claims) = service.validate_access_token(&token).unwrap();

        assert_eq!(user_id, user);
        assert_eq!(claims.aud, "authenticated");
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let other = JwtService::new("test-secret-key-that-is-long-enough", "anon", 900);
        let token = other.issue_access_token(UserId::random()).unwrap();

        assert!(matches!(
            service().validate_access_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let other = JwtService::new("a-different-secret-entirely", "authenticated", 900);
        let token = other.issue_access_token(UserId::random()).unwrap();
        assert!(service().validate_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let expired = JwtService::new("test-secret-key-that-is-long-enough", "authenticated", -3600);
        let token = expired.issue_access_token(UserId::random()).unwrap();
        assert!(matches!(
            service().validate_access_token(&token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_non_uuid_subject() {
        let claims = Claims {
            sub: "12345".to_string(),
            aud: "authenticated".to_string(),
            iat: 0,
            exp: i64::MAX,
            role: None,
            email: None,
        };
        assert!(matches!(claims.user_id(), Err(AppError::InvalidToken)));
        let id = uuid::Uuid::new_v4();
        let claims = Claims {
            sub: id.to_string(),
            ..claims
        };
        assert_eq!(claims.user_id().unwrap(), UserId::from_uuid(id));
    }
}
