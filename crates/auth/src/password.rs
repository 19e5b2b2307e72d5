//! Password hashing over bcrypt.
//!
//! Salting is per hash and handled by bcrypt itself; the encoded hash carries
//! the salt and cost, so verification needs nothing else.

use thiserror::Error;

/// bcrypt refuses to look past 72 bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MIN_PASSWORD_BYTES: usize = 8;

pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_BYTES} characters")]
    TooShort,

    #[error("password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidCost(u32),

    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Adaptive one-way hasher. Cheap to clone; holds only the cost factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_BCRYPT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Length policy applied at registration time.
    pub fn validate_strength(password: &str) -> Result<(), PasswordError> {
        if password.len() < MIN_PASSWORD_BYTES {
            return Err(PasswordError::TooShort);
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }
        Ok(())
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        bcrypt::hash(password, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Returns false for a wrong password and for a stored hash that is not
    /// valid bcrypt.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash could not be parsed");
                false
            }
        }
    }
}
