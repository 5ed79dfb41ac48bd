use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};

// JWT token expiration (in seconds)
const ACCESS_TOKEN_EXPIRE: i64 = 86400; // 24 hours

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (enterprise identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
    pub jti: String, // JWT ID for uniqueness
}

fn signing_secret() -> Result<String> {
    CONFIG
        .auth
        .jwt_secret
        .clone()
        .ok_or_else(|| AppError::Internal("JWT signing secret is not configured".to_string()))
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Create a JWT access token for an enterprise
pub fn create_access_token(
    subject: &str,
    email: Option<&str>,
    expires_in: Option<i64>,
) -> Result<String> {
    encode_with_secret(&signing_secret()?, subject, email, expires_in)
}

/// Decode and validate a JWT token
pub fn decode_token(token: &str) -> Result<Claims> {
    decode_with_secret(&signing_secret()?, token)
}

fn encode_with_secret(
    secret: &str,
    subject: &str,
    email: Option<&str>,
    expires_in: Option<i64>,
) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expires_in.unwrap_or(ACCESS_TOKEN_EXPIRE));

    let claims = Claims {
        sub: subject.to_string(),
        email: email.map(String::from),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key).map_err(|e| e.into())
}

fn decode_with_secret(secret: &str, token: &str) -> Result<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    // No clock skew tolerance for expiration check
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = encode_with_secret(SECRET, "42", Some("biz@example.com"), None).unwrap();
        let claims = decode_with_secret(SECRET, &token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email.as_deref(), Some("biz@example.com"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = encode_with_secret(SECRET, "42", None, Some(-60)).unwrap();
        assert!(decode_with_secret(SECRET, &token).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = encode_with_secret(SECRET, "42", None, None).unwrap();
        assert!(decode_with_secret("another-secret", &token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let mut token = encode_with_secret(SECRET, "42", None, None).unwrap();
        token.push('x');
        assert!(decode_with_secret(SECRET, &token).is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("s3cret!Pw").unwrap();
        assert!(verify_password("s3cret!Pw", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_password_with_garbage_hash() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
