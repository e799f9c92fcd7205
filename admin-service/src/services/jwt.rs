use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::TokenError;
use crate::config::AuthConfig;

/// Subject of every token this service issues; there is exactly one principal.
pub const ADMIN_SUBJECT: &str = "admin";

/// Issues and validates the HS256 bearer token of the administrative user.
///
/// Stateless: a token is valid iff its signature checks out and it has not
/// expired. There is no revocation before expiry.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    admin_password: Secret<String>,
    token_ttl: Duration,
}

/// Claims carried by the admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Subject (always "admin")
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly signed token and its expiry (Unix seconds).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();

        tracing::info!(
            ttl_hours = config.token_ttl_hours,
            "JWT service initialized with HS256 key"
        );

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            admin_password: config.admin_password.clone(),
            token_ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    /// Exchange the admin password for a signed token.
    pub fn issue(&self, password: &str) -> Result<IssuedToken, TokenError> {
        let matches: bool = password
            .as_bytes()
            .ct_eq(self.admin_password.expose_secret().as_bytes())
            .into();
        if !matches {
            return Err(TokenError::InvalidCredentials);
        }

        let now = Utc::now();
        let exp = now + self.token_ttl;
        self.sign(AdminClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// Verify signature and expiry; returns the subject claim.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<AdminClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                    _ => TokenError::InvalidToken,
                }
            })?;

        Ok(token_data.claims.sub)
    }

    fn sign(&self, claims: AdminClaims) -> Result<IssuedToken, TokenError> {
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Token lifetime in seconds.
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            admin_password: Secret::new("correct horse".to_string()),
            jwt_secret: Secret::new(secret.to_string()),
            token_ttl_hours: 24,
        }
    }

    #[test]
    fn issued_token_validates_as_admin() {
        let jwt = JwtService::new(&config("test-secret"));
        let issued = jwt.issue("correct horse").unwrap();

        assert_eq!(jwt.validate(&issued.token).unwrap(), ADMIN_SUBJECT);
    }

    #[test]
    fn issued_token_expires_in_24_hours() {
        let jwt = JwtService::new(&config("test-secret"));
        let before = Utc::now().timestamp();
        let issued = jwt.issue("correct horse").unwrap();
        let after = Utc::now().timestamp();

        assert!(issued.expires_at >= before + 24 * 3600);
        assert!(issued.expires_at <= after + 24 * 3600);
        assert_eq!(jwt.token_ttl_seconds(), 24 * 3600);
    }

    #[test]
    fn wrong_password_issues_nothing() {
        let jwt = JwtService::new(&config("test-secret"));

        assert!(matches!(
            jwt.issue("wrong"),
            Err(TokenError::InvalidCredentials)
        ));
        assert!(matches!(
            jwt.issue("correct horse "),
            Err(TokenError::InvalidCredentials)
        ));
        assert!(matches!(jwt.issue(""), Err(TokenError::InvalidCredentials)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtService::new(&config("test-secret"));
        let now = Utc::now().timestamp();
        let issued = jwt
            .sign(AdminClaims {
                sub: ADMIN_SUBJECT.to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(
            jwt.validate(&issued.token),
            Err(TokenError::TokenExpired)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuer = JwtService::new(&config("secret-a"));
        let verifier = JwtService::new(&config("secret-b"));
        let issued = issuer.issue("correct horse").unwrap();

        assert!(matches!(
            verifier.validate(&issued.token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let jwt = JwtService::new(&config("test-secret"));
        assert!(matches!(
            jwt.validate("not.a.jwt"),
            Err(TokenError::InvalidToken)
        ));
    }
}
