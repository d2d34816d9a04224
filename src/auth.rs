//! Bearer-token issuance and validation, plus password hashing.
//!
//! Tokens are stateless HS256 JWTs carrying the user's id as subject and a
//! fixed 72-hour expiry; nothing is persisted server-side. Passwords are
//! hashed with bcrypt and verification fails closed.

use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ApiError, ApiResult};

/// How long an issued token stays valid.
const TOKEN_LIFETIME_HOURS: i64 = 72;

#[derive(Debug, Error)]
pub enum TokenError {
    /// The signature check failed, or the token was signed with an algorithm
    /// outside the expected HMAC family.
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    /// The payload decoded fine but carries no usable subject.
    #[error("token does not identify a user")]
    MissingSubject,

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    exp: i64,
}

/// Signing and verification keys, derived once from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token identifying `subject`, valid for the next 72 hours.
    pub fn issue(&self, subject: ObjectId) -> Result<String, TokenError> {
        self.issue_expiring_in(subject, Duration::hours(TOKEN_LIFETIME_HOURS))
    }

    fn issue_expiring_in(
        &self,
        subject: ObjectId,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: Some(subject.to_hex()),
            exp: (Utc::now() + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Verifies signature and expiry, then returns the subject id.
    pub fn validate(&self, token: &str) -> Result<ObjectId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })?;

        let subject = data
            .claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(TokenError::MissingSubject)?;

        ObjectId::parse_str(&subject).map_err(|_| TokenError::MissingSubject)
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Signing(_) => ApiError::Internal(error.to_string()),
            _ => ApiError::Unauthorized(error.to_string()),
        }
    }
}

pub fn hash_password(plaintext: &str) -> ApiResult<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
        .map_err(|err| ApiError::Internal(format!("failed to hash password: {}", err)))
}

/// Checks `plaintext` against a stored digest. Any bcrypt failure counts as
/// a mismatch.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-adequately-long-test-secret";

    #[test]
    fn issued_token_validates_to_the_same_subject() {
        let keys = TokenKeys::from_secret(SECRET);
        let subject = ObjectId::new();

        let token = keys.issue(subject).unwrap();

        assert_eq!(keys.validate(&token).unwrap(), subject);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::from_secret(SECRET);

        let token = keys
            .issue_expiring_in(ObjectId::new(), Duration::hours(-1))
            .unwrap();

        assert!(matches!(keys.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_a_different_key_is_rejected() {
        let token = TokenKeys::from_secret("somebody-elses-secret")
            .issue(ObjectId::new())
            .unwrap();

        let keys = TokenKeys::from_secret(SECRET);
        assert!(matches!(
            keys.validate(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn token_signed_with_a_different_algorithm_is_rejected() {
        let claims = Claims {
            sub: Some(ObjectId::new().to_hex()),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let keys = TokenKeys::from_secret(SECRET);
        assert!(matches!(
            keys.validate(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn token_without_a_subject_is_rejected() {
        let claims = Claims {
            sub: None,
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let keys = TokenKeys::from_secret(SECRET);
        assert!(matches!(
            keys.validate(&token),
            Err(TokenError::MissingSubject)
        ));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let keys = TokenKeys::from_secret(SECRET);

        assert!(matches!(
            keys.validate("not.a.token"),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn hashed_password_verifies_against_the_same_plaintext() {
        let digest = hash_password("hunter2").unwrap();

        assert!(verify_password("hunter2", &digest));
        assert!(!verify_password("hunter3", &digest));
    }

    #[test]
    fn verification_fails_closed_on_a_bad_digest() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-digest"));
    }
}
