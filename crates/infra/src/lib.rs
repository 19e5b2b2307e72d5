//! Infrastructure layer: persistence, mail, configuration and the services
//! that tie them to the auth boundary.

pub mod accounts;
pub mod clinic;
pub mod config;
pub mod error;
pub mod mailer;
#[cfg(feature = "smtp")]
pub mod smtp;
pub mod store;

pub use accounts::AccountService;
pub use clinic::{ClinicService, ClinicStores};
pub use config::{AppConfig, AuthSettings, ConfigError, SmtpSettings};
pub use error::{AccountError, AccountResult};
