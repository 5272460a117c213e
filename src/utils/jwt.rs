use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("failed to create token: {0}")]
    Creation(jsonwebtoken::errors::Error),
    #[error("invalid or expired token: {0}")]
    Verification(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn create_jwt(user_id: i32, role: &str, secret: &str) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::Creation)
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(JwtError::Verification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_subject_and_role() {
        let token = create_jwt(42, "park_guide", "test-secret").unwrap();
        let claims = verify_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "park_guide");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verification_fails_with_wrong_secret() {
        let token = create_jwt(7, "admin", "secret-a").unwrap();
        assert!(verify_jwt(&token, "secret-b").is_err());
    }
}
