//! Process configuration, read from `APEXHMS_*` environment variables.

use chrono::Duration;
use thiserror::Error;

use apexhms_auth::{TokenTtlPolicy, password};

const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings the account service needs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub token_ttl: TokenTtlPolicy,
    /// `None` disables verification-token expiry.
    pub verification_ttl: Option<Duration>,
    /// Base URL of the frontend; the verification link is built from it.
    pub public_url: String,
}

impl core::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("token_ttl", &self.token_ttl)
            .field("verification_ttl", &self.verification_ttl)
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl AuthSettings {
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.public_url.trim_end_matches('/'), token)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SuperAdminSeed {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for SuperAdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SuperAdminSeed")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Outgoing mail relay. Without it, mail is only logged.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Username and password, when the relay wants them.
    pub credentials: Option<(String, String)>,
    /// Sender, e.g. `ApexHMS <no-reply@example.org>`.
    pub from: String,
    pub starttls: bool,
}

impl core::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.credentials.as_ref().map(|(u, _)| u))
            .field("from", &self.from)
            .field("starttls", &self.starttls)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub auth: AuthSettings,
    pub database_url: Option<String>,
    pub super_admin: Option<SuperAdminSeed>,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("APEXHMS_JWT_SECRET").ok_or(ConfigError::Missing("APEXHMS_JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid {
                key: "APEXHMS_JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_BYTES} bytes"),
            });
        }

        let bcrypt_cost = match get("APEXHMS_BCRYPT_COST") {
            Some(raw) => parse_u32("APEXHMS_BCRYPT_COST", &raw)?,
            None => password::DEFAULT_BCRYPT_COST,
        };
        if !(password::MIN_BCRYPT_COST..=password::MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "APEXHMS_BCRYPT_COST",
                reason: format!(
                    "must be within {}..={}",
                    password::MIN_BCRYPT_COST,
                    password::MAX_BCRYPT_COST
                ),
            });
        }
        if bcrypt_cost < 10 {
            tracing::warn!(bcrypt_cost, "bcrypt cost below 10 is only suitable for tests");
        }

        let defaults = TokenTtlPolicy::default();
        let token_ttl = TokenTtlPolicy {
            admin: positive_secs(&get, "APEXHMS_TOKEN_TTL_ADMIN_SECS", defaults.admin)?,
            staff: positive_secs(&get, "APEXHMS_TOKEN_TTL_STAFF_SECS", defaults.staff)?,
            patient: positive_secs(&get, "APEXHMS_TOKEN_TTL_PATIENT_SECS", defaults.patient)?,
        };

        let verification_ttl = match get("APEXHMS_VERIFICATION_TTL_SECS") {
            Some(raw) => match parse_u32("APEXHMS_VERIFICATION_TTL_SECS", &raw)? {
                0 => None,
                secs => Some(Duration::seconds(i64::from(secs))),
            },
            None => Some(Duration::hours(48)),
        };

        let super_admin = match (get("APEXHMS_SUPER_ADMIN_EMAIL"), get("APEXHMS_SUPER_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SuperAdminSeed { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "APEXHMS_SUPER_ADMIN_EMAIL",
                    reason: "email and password must be set together".to_string(),
                });
            }
        };

        let smtp = match get("APEXHMS_SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                port: match get("APEXHMS_SMTP_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        key: "APEXHMS_SMTP_PORT",
                        reason: e.to_string(),
                    })?,
                    None => 587,
                },
                credentials: match (get("APEXHMS_SMTP_USERNAME"), get("APEXHMS_SMTP_PASSWORD")) {
                    (Some(user), Some(pass)) => Some((user, pass)),
                    (None, None) => None,
                    _ => {
                        return Err(ConfigError::Invalid {
                            key: "APEXHMS_SMTP_USERNAME",
                            reason: "username and password must be set together".to_string(),
                        });
                    }
                },
                from: get("APEXHMS_SMTP_FROM").ok_or(ConfigError::Missing("APEXHMS_SMTP_FROM"))?,
                starttls: match get("APEXHMS_SMTP_STARTTLS").as_deref() {
                    None | Some("true") | Some("1") => true,
                    Some("false") | Some("0") => false,
                    Some(other) => {
                        return Err(ConfigError::Invalid {
                            key: "APEXHMS_SMTP_STARTTLS",
                            reason: format!("expected true or false, got {other:?}"),
                        });
                    }
                },
                host,
            }),
            None => None,
        };

        Ok(Self {
            bind_addr: get("APEXHMS_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            auth: AuthSettings {
                jwt_secret,
                bcrypt_cost,
                token_ttl,
                verification_ttl,
                public_url: get("APEXHMS_PUBLIC_URL").unwrap_or_else(|| "http://localhost:5173".to_string()),
            },
            database_url: get("APEXHMS_DATABASE_URL"),
            super_admin,
            smtp,
        })
    }
}

fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn positive_secs(
    get: &dyn Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match get(key) {
        Some(raw) => match parse_u32(key, &raw)? {
            0 => Err(ConfigError::Invalid {
                key,
                reason: "must be greater than zero".to_string(),
            }),
            secs => Ok(Duration::seconds(i64::from(secs))),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[("APEXHMS_JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.auth.bcrypt_cost, 12);
        assert_eq!(cfg.auth.token_ttl, TokenTtlPolicy::default());
        assert_eq!(cfg.auth.verification_ttl, Some(Duration::hours(48)));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.super_admin, None);
        assert_eq!(cfg.smtp, None);
    }

    #[test]
    fn smtp_relay_settings() {
        let cfg = load(&[
            ("APEXHMS_JWT_SECRET", SECRET),
            ("APEXHMS_SMTP_HOST", "smtp.example.org"),
            ("APEXHMS_SMTP_USERNAME", "mailer"),
            ("APEXHMS_SMTP_PASSWORD", "s3cret"),
            ("APEXHMS_SMTP_FROM", "ApexHMS <no-reply@example.org>"),
        ])
        .unwrap();
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert!(smtp.starttls);
        assert_eq!(smtp.credentials, Some(("mailer".to_string(), "s3cret".to_string())));
        assert!(!format!("{smtp:?}").contains("s3cret"));

        assert_eq!(
            load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_SMTP_HOST", "smtp.example.org")]).unwrap_err(),
            ConfigError::Missing("APEXHMS_SMTP_FROM")
        );
        assert!(matches!(
            load(&[
                ("APEXHMS_JWT_SECRET", SECRET),
                ("APEXHMS_SMTP_HOST", "smtp.example.org"),
                ("APEXHMS_SMTP_FROM", "no-reply@example.org"),
                ("APEXHMS_SMTP_PORT", "nope"),
            ]),
            Err(ConfigError::Invalid { key: "APEXHMS_SMTP_PORT", .. })
        ));
    }

    #[test]
    fn secret_is_required_and_long_enough() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("APEXHMS_JWT_SECRET"));
        assert!(matches!(
            load(&[("APEXHMS_JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { key: "APEXHMS_JWT_SECRET", .. })
        ));
    }

    #[test]
    fn bcrypt_cost_bounds() {
        assert!(load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_BCRYPT_COST", "3")]).is_err());
        assert!(load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_BCRYPT_COST", "abc")]).is_err());
        let cfg = load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_BCRYPT_COST", "4")]).unwrap();
        assert_eq!(cfg.auth.bcrypt_cost, 4);
    }

    #[test]
    fn zero_verification_ttl_disables_expiry() {
        let cfg = load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_VERIFICATION_TTL_SECS", "0")]).unwrap();
        assert_eq!(cfg.auth.verification_ttl, None);
    }

    #[test]
    fn zero_token_ttl_is_rejected() {
        assert!(load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_TOKEN_TTL_STAFF_SECS", "0")]).is_err());
    }

    #[test]
    fn super_admin_seed_needs_both_halves() {
        assert!(load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_SUPER_ADMIN_EMAIL", "root@apex.io")]).is_err());
        let cfg = load(&[
            ("APEXHMS_JWT_SECRET", SECRET),
            ("APEXHMS_SUPER_ADMIN_EMAIL", "root@apex.io"),
            ("APEXHMS_SUPER_ADMIN_PASSWORD", "Secret123!"),
        ])
        .unwrap();
        assert_eq!(cfg.super_admin.map(|s| s.email), Some("root@apex.io".to_string()));
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = load(&[("APEXHMS_JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{cfg:?}").contains(SECRET));
    }

    #[test]
    fn verification_link() {
        let cfg = load(&[("APEXHMS_JWT_SECRET", SECRET), ("APEXHMS_PUBLIC_URL", "https://hms.example/")]).unwrap();
        assert_eq!(cfg.auth.verification_link("abc"), "https://hms.example/verify-email?token=abc");
    }
}
