//! Bearer token issuance and verification (HS256 JWT).
//!
//! Tokens are stateless: nothing is stored at issuance, so a token stays
//! valid until `exp`. Lifetimes are therefore kept short for roles that can
//! administer a hospital or the platform.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::Serialize;
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};
use crate::{Principal, Role, RoleFamily};

/// Why a token was refused.
///
/// Only for server-side logging: every variant surfaces to the client as the
/// same unauthenticated outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("signature mismatch")]
    BadSignature,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("claims do not describe a valid principal")]
    InvalidPrincipal,

    #[error("token lifetime must be positive")]
    InvalidTtl,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Verifies bearer tokens against a clock supplied by the caller.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Token lifetimes per role family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtlPolicy {
    /// Super-admin and hospital administrators.
    pub admin: Duration,
    /// Clinical staff.
    pub staff: Duration,
    pub patient: Duration,
}

impl Default for TokenTtlPolicy {
    fn default() -> Self {
        Self {
            admin: Duration::hours(1),
            staff: Duration::hours(8),
            patient: Duration::hours(24),
        }
    }
}

impl TokenTtlPolicy {
    pub fn ttl_for(&self, role: Role) -> Duration {
        match role.family() {
            RoleFamily::Platform | RoleFamily::Administrative => self.admin,
            RoleFamily::Clinical => self.staff,
            RoleFamily::Patient => self.patient,
        }
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 issuer/validator over a server-held secret.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").finish_non_exhaustive()
    }
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Time checks run in `validate_claims` against the injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, principal: &Principal, ttl: Duration, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidTtl);
        }

        let expires_at = now + ttl;
        let claims = JwtClaims::for_principal(principal, now, expires_at);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                other => TokenError::Malformed(format!("{other:?}")),
            },
        )?;

        let claims = data.claims;
        validate_claims(&claims, now)?;
        claims.principal().map_err(|_| TokenError::InvalidPrincipal)?;

        Ok(claims)
    }
}
