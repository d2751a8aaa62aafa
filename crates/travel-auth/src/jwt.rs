//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use travel_db::{User, UserRole};

use crate::error::AuthError;

/// How long an issued token stays valid
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// User role at issue time
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Role a caller must hold for a token to be accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    /// Any authenticated user; skips the role comparison entirely
    Any,
    /// Claimed role and currently stored role must both equal this one
    Exactly(UserRole),
}

impl RequiredRole {
    /// Check a token's claimed role against the role stored for its subject
    pub fn permits(&self, claimed: UserRole, stored: UserRole) -> bool {
        match self {
            RequiredRole::Any => true,
            RequiredRole::Exactly(role) => *role == claimed && claimed == stored,
        }
    }
}

#[derive(Deserialize)]
struct Subject {
    sub: String,
}

/// Issues and verifies tokens signed with each user's own salt
#[derive(Debug, Clone)]
pub struct TokenCodec {
    lifetime: Duration,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self {
            lifetime: Duration::seconds(TOKEN_LIFETIME_SECS),
        }
    }
}

impl TokenCodec {
    /// Create a codec with a custom token lifetime
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self { lifetime }
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token for a user as if it were `now`
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        debug!("Generating token for user: {}", user.username);

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&user.salt),
        )
        .map_err(AuthError::Jwt)
    }

    /// Read the subject of a token without checking its signature
    ///
    /// The result is untrusted; it only names whose salt to verify with.
    pub fn peek_subject(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        let data = decode::<Subject>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(data.claims.sub)
    }

    /// Verify a token's signature and time window with the subject's salt
    pub fn verify(&self, token: &str, salt: &[u8]) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        let data = decode::<Claims>(token, &DecodingKey::from_secret(salt), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                ErrorKind::InvalidSignature => AuthError::InvalidToken,
                _ => AuthError::Jwt(e),
            })?;

        Ok(data.claims)
    }
}
