//! Single-use email verification tokens.
//!
//! The token is a bearer secret: whoever holds the link can activate the
//! account, so it carries 256 bits from the OS RNG and is compared in
//! constant time where it is compared in process.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

const TOKEN_BYTES: usize = 32;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a token received from a client. No shape check: an unknown
    /// token simply never matches.
    pub fn from_client(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep the secret out of logs.
impl core::fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("VerificationToken(..)")
    }
}

/// An outstanding verification attached to an unverified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub token: VerificationToken,
    pub issued_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn issue(now: DateTime<Utc>) -> Self {
        Self {
            token: VerificationToken::generate(),
            issued_at: now,
        }
    }

    /// `ttl = None` means the token never expires.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => now < self.issued_at + ttl,
            None => true,
        }
    }

    pub fn matches(&self, candidate: &VerificationToken) -> bool {
        tokens_match(self.token.as_str(), candidate.as_str())
    }
}

/// Constant-time equality over the token bytes.
pub fn tokens_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
