//! `apexhms-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it hashes,
//! signs, verifies and decides, and leaves persistence to its callers.

pub mod authorize;
pub mod claims;
pub mod credential;
pub mod error;
pub mod login;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod verification;

pub use authorize::{DenialReason, Policy, require_role, require_tenant, tenant_filter};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use credential::{AccountStatus, AccountView, Credential};
pub use error::AuthError;
pub use login::check_login;
pub use password::{PasswordError, PasswordHasher};
pub use principal::{Principal, PrincipalError, PrincipalView};
pub use roles::{Role, RoleFamily, RoleSet};
pub use token::{Hs256Jwt, IssuedToken, JwtValidator, TokenError, TokenTtlPolicy};
pub use verification::{PendingVerification, VerificationToken, tokens_match};
