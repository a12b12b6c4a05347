use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;

/// Format of the human readable `expiry` claim in OTP challenge tokens.
pub const OTP_EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims of access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Username
    pub sub: String,
    /// User id
    pub id: i32,
    pub scopes: Vec<String>,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the challenge token emailed during registration and password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpClaims {
    pub email: String,
    /// The six digit code
    pub token: String,
    pub expiry: String,
    pub exp: i64,
}

/// Signs and verifies every token the service hands out, using one symmetric
/// key and an HMAC algorithm fixed at startup.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_minutes: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret_key.expose_secret().as_bytes();

        tracing::info!(algorithm = ?config.algorithm, "JWT service initialized");

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: config.algorithm,
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_minutes: config.refresh_token_expiry_minutes(),
        }
    }

    pub fn generate_access_token(
        &self,
        username: &str,
        user_id: i32,
        scopes: Vec<String>,
    ) -> Result<String, TokenError> {
        self.generate_session_token(
            username,
            user_id,
            scopes,
            TokenKind::Access,
            Duration::minutes(self.access_token_expiry_minutes),
        )
    }

    pub fn generate_refresh_token(
        &self,
        username: &str,
        user_id: i32,
        scopes: Vec<String>,
    ) -> Result<String, TokenError> {
        self.generate_session_token(
            username,
            user_id,
            scopes,
            TokenKind::Refresh,
            Duration::minutes(self.refresh_token_expiry_minutes),
        )
    }

    fn generate_session_token(
        &self,
        username: &str,
        user_id: i32,
        scopes: Vec<String>,
        typ: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: username.to_string(),
            id: user_id,
            scopes,
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        self.sign(&claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.validate_session_token(token, TokenKind::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.validate_session_token(token, TokenKind::Refresh)
    }

    fn validate_session_token(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<SessionClaims, TokenError> {
        let claims: SessionClaims = self.verify(token, &["exp", "sub"])?;

        if claims.typ != expected {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }

    /// Challenge token binding `email` to `otp` until `expires_at`.
    pub fn generate_otp_token(
        &self,
        email: &str,
        otp: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = OtpClaims {
            email: email.to_string(),
            token: otp.to_string(),
            expiry: expires_at.format(OTP_EXPIRY_FORMAT).to_string(),
            exp: expires_at.timestamp(),
        };

        self.sign(&claims)
    }

    pub fn decode_otp_token(&self, token: &str) -> Result<OtpClaims, TokenError> {
        self.verify(token, &["exp"])
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, required: &[&str]) -> Result<T, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(required);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret_key: SecretString::new("test-secret-key".to_string()),
            algorithm: Algorithm::HS256,
            access_token_expiry_minutes: 1440,
        })
    }

    #[test]
    fn access_token_round_trips_claims() {
        let jwt = service();
        let scopes = vec!["ADMIN".to_string(), "MANAGER".to_string()];
        let token = jwt.generate_access_token("jane", 7, scopes.clone()).unwrap();

        let claims = jwt.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "jane");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.scopes, scopes);
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 1440 * 60);
    }

    #[test]
    fn refresh_token_lives_twice_as_long() {
        let jwt = service();
        let token = jwt.generate_refresh_token("jane", 7, vec![]).unwrap();

        let claims = jwt.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 2880 * 60);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let jwt = service();
        let access = jwt.generate_access_token("jane", 7, vec![]).unwrap();
        let refresh = jwt.generate_refresh_token("jane", 7, vec![]).unwrap();

        assert!(matches!(jwt.validate_refresh_token(&access), Err(TokenError::Invalid)));
        assert!(matches!(jwt.validate_access_token(&refresh), Err(TokenError::Invalid)));
    }

    #[test]
    fn expired_session_token_is_rejected() {
        let jwt = service();
        let token = jwt
            .generate_session_token("jane", 7, vec![], TokenKind::Access, Duration::seconds(-5))
            .unwrap();

        assert!(matches!(jwt.validate_access_token(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let jwt = service();
        let token = jwt.generate_access_token("jane", 7, vec![]).unwrap();
        let tampered = format!("{}x", token);

        assert!(matches!(jwt.validate_access_token(&tampered), Err(TokenError::Invalid)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = JwtService::new(&JwtConfig {
            secret_key: SecretString::new("another-secret".to_string()),
            algorithm: Algorithm::HS256,
            access_token_expiry_minutes: 1440,
        });
        let token = other.generate_access_token("jane", 7, vec![]).unwrap();

        assert!(matches!(service().validate_access_token(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn otp_token_round_trips() {
        let jwt = service();
        let expires_at = Utc::now() + Duration::minutes(5);
        let token = jwt.generate_otp_token("a@b.com", "123456", expires_at).unwrap();

        let claims = jwt.decode_otp_token(&token).unwrap();
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.token, "123456");
        assert_eq!(claims.expiry, expires_at.format(OTP_EXPIRY_FORMAT).to_string());
    }

    #[test]
    fn expired_otp_token_is_rejected() {
        let jwt = service();
        let token = jwt
            .generate_otp_token("a@b.com", "123456", Utc::now() - Duration::seconds(1))
            .unwrap();

        assert_eq!(jwt.decode_otp_token(&token).unwrap_err(), TokenError::Expired);
    }
}
