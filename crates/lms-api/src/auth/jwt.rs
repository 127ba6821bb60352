use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Session claims issued by the identity provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // identity provider subject id
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Issue a session token for an external subject.
///
/// Production tokens come from the identity provider; this exists for local
/// tooling and tests sharing the same secret.
pub fn generate_session_token(
    external_id: &str,
    email: Option<String>,
    jwt_secret: &str,
    expiry_hours: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: external_id.to_string(),
        email,
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(expiry_hours)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token
pub fn verify_session_token(token: &str, jwt_secret: &str) -> Result<Claims, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| ApiError::Unauthenticated("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_jwt_secret_minimum_32_characters_long";

    #[test]
    fn test_generate_and_verify_session_token() {
        let token = generate_session_token(
            "user_2abc",
            Some("test@example.com".to_string()),
            SECRET,
            24,
        )
        .expect("Failed to generate token");

        assert!(!token.is_empty(), "Token should not be empty");

        let claims = verify_session_token(&token, SECRET).expect("Failed to verify token");

        assert_eq!(claims.sub, "user_2abc");
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert!(
            claims.exp > claims.iat,
            "Expiration should be after issued at"
        );
    }

    #[test]
    fn test_verify_session_token_with_wrong_secret() {
        let token = generate_session_token("user_2abc", None, SECRET, 24)
            .expect("Failed to generate token");

        let result = verify_session_token(&token, "wrong_jwt_secret_minimum_32_characters_long");

        match result {
            Err(ApiError::Unauthenticated(msg)) => {
                assert!(msg.contains("Invalid or expired token"));
            }
            _ => panic!("Expected Unauthenticated error"),
        }
    }

    #[test]
    fn test_verify_invalid_session_token() {
        let result = verify_session_token("invalid.jwt.token", SECRET);

        assert!(
            matches!(result, Err(ApiError::Unauthenticated(_))),
            "Verification should fail for invalid token"
        );
    }

    #[test]
    fn test_expired_session_token_rejected() {
        // Past the default 60s leeway
        let token = generate_session_token("user_2abc", None, SECRET, -1)
            .expect("Failed to generate token");

        assert!(verify_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_claims_without_email() {
        let json = r#"{"sub":"user_2abc","exp":2000000000,"iat":1700000000}"#;
        let claims: Claims = serde_json::from_str(json).expect("Failed to deserialize claims");

        assert_eq!(claims.sub, "user_2abc");
        assert!(claims.email.is_none());
    }
}
