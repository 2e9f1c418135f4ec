//! JWT token service
//!
//! Mints and validates the bearer tokens handed out by anonymous sign-in.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime: 30 days
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 43_200;

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret (at least 32 bytes)
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Load from `JWT_SECRET`, `JWT_EXPIRATION_MINUTES`, `JWT_ISSUER`, `JWT_AUDIENCE`
    ///
    /// A missing or short secret is fatal in production. Elsewhere a random
    /// secret is generated and tokens do not survive a restart.
    pub fn from_env(is_production: bool) -> Result<Self, JwtError> {
        let secret = match load_jwt_secret() {
            Ok(secret) => secret,
            Err(e) if is_production => return Err(e),
            Err(e) => {
                tracing::warn!("JWT configuration error: {}, using a generated development key", e);
                generate_printable_secret()?
            }
        };

        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EXPIRATION_MINUTES),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "record-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "cleanroom-forms".to_string()),
        })
    }

    /// Fixed configuration for tests and embedded servers
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            issuer: "record-server".to_string(),
            audience: "cleanroom-forms".to_string(),
        }
    }
}

/// JWT claims of an anonymous principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Anonymous uid (uuid v4)
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn load_jwt_secret() -> Result<String, JwtError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| JwtError::ConfigError("JWT_SECRET is not set".to_string()))?;
    if secret.len() < MIN_SECRET_LEN {
        return Err(JwtError::ConfigError(format!(
            "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
        )));
    }
    Ok(secret)
}

/// Random 64-character printable secret
pub fn generate_printable_secret() -> Result<String, JwtError> {
    const ALLOWED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    rng.fill(&mut bytes).map_err(|_| {
        JwtError::KeyGenerationFailed("Failed to generate secure random key".to_string())
    })?;

    Ok(bytes
        .iter()
        .map(|b| ALLOWED[*b as usize % ALLOWED.len()] as char)
        .collect())
}

/// Token minted for a principal
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
}

/// JWT token service
#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Mint a token for `uid`
    pub fn generate_token(&self, uid: &str) -> Result<IssuedToken, JwtError> {
        self.generate_token_at(uid, Utc::now().timestamp())
    }

    fn generate_token_at(&self, uid: &str, issued_at: i64) -> Result<IssuedToken, JwtError> {
        let expires_at = issued_at + Duration::minutes(self.config.expiration_minutes).num_seconds();
        let claims = Claims {
            sub: uid.to_string(),
            exp: expires_at,
            iat: issued_at,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Extract the token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
    }
}

/// Principal of an authenticated request
///
/// Inserted into request extensions by [`require_auth`](crate::auth::require_auth).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrincipal {
    pub uid: String,
}

impl From<Claims> for CurrentPrincipal {
    fn from(claims: Claims) -> Self {
        Self { uid: claims.sub }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig::with_secret("0123456789abcdef0123456789abcdef"))
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = service();
        let issued = jwt.generate_token("uid-1").unwrap();
        let claims = jwt.validate_token(&issued.token).unwrap();
        assert_eq!(claims.sub, "uid-1");
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, DEFAULT_EXPIRATION_MINUTES * 60);
    }

    #[test]
    fn test_expired_token() {
        let jwt = service();
        let long_ago = Utc::now().timestamp() - 2 * DEFAULT_EXPIRATION_MINUTES * 60;
        let issued = jwt.generate_token_at("uid-1", long_ago).unwrap();
        assert!(matches!(
            jwt.validate_token(&issued.token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = JwtService::with_config(JwtConfig::with_secret(
            "ffffffffffffffffffffffffffffffffffff",
        ));
        let issued = other.generate_token("uid-1").unwrap();
        assert!(matches!(
            service().validate_token(&issued.token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_generated_secret_is_long_enough() {
        let secret = generate_printable_secret().unwrap();
        assert_eq!(secret.len(), 64);
        assert!(secret.len() >= MIN_SECRET_LEN);
    }
}
