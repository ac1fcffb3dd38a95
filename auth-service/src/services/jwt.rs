use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// Discriminates a full session credential from the short-lived token that
/// only proves "password verified, OTP pending". The two are not
/// interchangeable: auth middleware rejects `LoginOtp` tokens outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Session,
    LoginOtp,
}

/// JWT claims for both token types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Token type discriminator
    pub typ: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

/// JWT service for token generation and validation (HS256, shared secret).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expiry_days: i64,
    otp_token_expiry_minutes: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            session_expiry_days: config.session_expiry_days,
            otp_token_expiry_minutes: config.otp_token_expiry_minutes,
        }
    }

    fn generate(
        &self,
        user_id: &str,
        email: &str,
        typ: TokenType,
        ttl: Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            typ,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    /// Full session token (7 days by default).
    pub fn generate_session_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, anyhow::Error> {
        self.generate(
            user_id,
            email,
            TokenType::Session,
            Duration::days(self.session_expiry_days),
        )
    }

    /// Intermediate token proving a passed password check while an OTP is
    /// pending (10 minutes by default).
    pub fn generate_otp_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, anyhow::Error> {
        self.generate(
            user_id,
            email,
            TokenType::LoginOtp,
            Duration::minutes(self.otp_token_expiry_minutes),
        )
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        if token_data.claims.typ != expected {
            return Err(anyhow::anyhow!("Wrong token type"));
        }

        Ok(token_data.claims)
    }

    /// Validate a full session token. A `login_otp` token fails here.
    pub fn validate_session_token(&self, token: &str) -> Result<Claims, anyhow::Error> {
        self.validate(token, TokenType::Session)
    }

    /// Validate an intermediate OTP-pending token. A session token fails here.
    pub fn validate_otp_token(&self, token: &str) -> Result<Claims, anyhow::Error> {
        self.validate(token, TokenType::LoginOtp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test_secret_for_unit_tests_only".to_string(),
            session_expiry_days: 7,
            otp_token_expiry_minutes: 10,
        })
    }

    #[test]
    fn test_session_token_roundtrip() {
        let service = test_service();
        let token = service
            .generate_session_token("user_123", "test@example.com")
            .unwrap();
        assert!(!token.is_empty());

        let claims = service.validate_session_token(&token).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.typ, TokenType::Session);
    }

    #[test]
    fn test_otp_token_roundtrip() {
        let service = test_service();
        let token = service
            .generate_otp_token("user_123", "test@example.com")
            .unwrap();

        let claims = service.validate_otp_token(&token).unwrap();
        assert_eq!(claims.typ, TokenType::LoginOtp);
    }

    #[test]
    fn test_otp_token_is_not_a_session_credential() {
        let service = test_service();
        let token = service
            .generate_otp_token("user_123", "test@example.com")
            .unwrap();

        assert!(service.validate_session_token(&token).is_err());
    }

    #[test]
    fn test_session_token_is_not_an_otp_token() {
        let service = test_service();
        let token = service
            .generate_session_token("user_123", "test@example.com")
            .unwrap();

        assert!(service.validate_otp_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = test_service();
        assert!(service.validate_session_token("not.a.token").is_err());
    }

    #[test]
    fn test_tokens_signed_with_other_secret_are_rejected() {
        let service = test_service();
        let other = JwtService::new(&JwtConfig {
            secret: "a_different_secret_entirely".to_string(),
            session_expiry_days: 7,
            otp_token_expiry_minutes: 10,
        });

        let token = other
            .generate_session_token("user_123", "test@example.com")
            .unwrap();
        assert!(service.validate_session_token(&token).is_err());
    }
}
