//! JWT token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, AuthResult, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_JWT_ISSUER};

/// Claims of a bearer token issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the identity provider's user ID).
    pub sub: String,
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// JWT ID.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a subject.
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
        issuer: impl Into<String>,
        expiration_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: subject.into(),
            email: email.into(),
            name,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer.into(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the subject, rejecting blank ones.
    pub fn subject(&self) -> AuthResult<&str> {
        let sub = self.sub.trim();
        if sub.is_empty() {
            return Err(AuthError::InvalidClaims("empty subject".to_string()));
        }
        Ok(sub)
    }

    /// Returns true if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret shared with the identity provider.
    pub secret: String,
    /// Token expiration in hours.
    pub expiration_hours: u64,
    /// Expected token issuer.
    pub issuer: String,
}

impl JwtConfig {
    /// Creates a new JWT configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            issuer: DEFAULT_JWT_ISSUER.to_string(),
        }
    }

    /// Sets the expiration time in hours.
    pub fn with_expiration_hours(mut self, hours: u64) -> Self {
        self.expiration_hours = hours;
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("expiration_hours", &self.config.expiration_hours)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a new JWT manager.
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a token for a subject, signed with the shared secret.
    pub fn generate_token(
        &self,
        subject: &str,
        email: &str,
        name: Option<String>,
    ) -> AuthResult<String> {
        let claims = Claims::new(
            subject,
            email,
            name,
            self.config.issuer.clone(),
            self.config.expiration_hours,
        );

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtEncoding(e.to_string()))
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-must-be-long-enough-for-security";

    #[test]
    fn test_jwt_generation_and_validation() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));

        let token = manager
            .generate_token("idp|alice", "alice@example.com", Some("Alice".to_string()))
            .unwrap();

        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.subject().unwrap(), "idp|alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.name.as_deref(), Some("Alice"));
        assert_eq!(claims.iss, DEFAULT_JWT_ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_custom_issuer_round_trip() {
        let manager = JwtManager::new(JwtConfig::new(SECRET).with_issuer("https://id.example.com"));
        let token = manager
            .generate_token("idp|bob", "bob@example.com", None)
            .unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.iss, "https://id.example.com");
    }

    #[test]
    fn test_issuer_mismatch_is_rejected() {
        let issuing = JwtManager::new(JwtConfig::new(SECRET).with_issuer("someone-else"));
        let validating = JwtManager::new(JwtConfig::new(SECRET));

        let token = issuing
            .generate_token("idp|bob", "bob@example.com", None)
            .unwrap();
        assert!(validating.validate_token(&token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));

        let result = manager.validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = JwtManager::new(JwtConfig::new("secret-one-must-be-long-enough"));
        let manager2 = JwtManager::new(JwtConfig::new("secret-two-must-be-long-enough"));

        let token = manager1
            .generate_token("idp|carol", "carol@example.com", None)
            .unwrap();

        let result = manager2.validate_token(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_subject_is_rejected() {
        let claims = Claims::new("  ", "x@example.com", None, DEFAULT_JWT_ISSUER, 1);
        assert!(matches!(claims.subject(), Err(AuthError::InvalidClaims(_))));
    }
}
