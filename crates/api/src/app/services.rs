//! Service wiring: stores, mailer and the account/clinic services.
//!
//! Store handles are built once here and injected; handlers only ever see
//! `AppServices`.

use std::sync::Arc;

use apexhms_auth::{Hs256Jwt, JwtValidator};
use apexhms_infra::mailer::{LogMailer, Mailer};
use apexhms_infra::store::{CredentialStore, HospitalStore, InMemoryCredentialStore, InMemoryHospitalStore};
use apexhms_infra::{
    AccountResult, AccountService, AppConfig, AuthSettings, ClinicService, ClinicStores, SmtpSettings,
};

pub struct AppServices {
    pub accounts: AccountService,
    pub clinic: ClinicService,
    pub jwt: Arc<Hs256Jwt>,
    /// Frontend origin allowed by CORS.
    pub public_url: String,
}

impl AppServices {
    pub fn new(
        settings: AuthSettings,
        credentials: Arc<dyn CredentialStore>,
        hospitals: Arc<dyn HospitalStore>,
        clinic_stores: ClinicStores,
        mailer: Arc<dyn Mailer>,
    ) -> AccountResult<Self> {
        let jwt = Arc::new(Hs256Jwt::new(settings.jwt_secret.as_bytes()));
        let public_url = settings.public_url.clone();
        let accounts = AccountService::new(
            credentials.clone(),
            hospitals,
            clinic_stores.clone(),
            mailer.clone(),
            jwt.clone(),
            settings,
        )?;
        let clinic = ClinicService::new(clinic_stores, credentials, mailer);

        Ok(Self {
            accounts,
            clinic,
            jwt,
            public_url,
        })
    }

    /// Everything in memory; used for development and tests.
    pub fn in_memory(settings: AuthSettings, mailer: Arc<dyn Mailer>) -> AccountResult<Self> {
        Self::new(
            settings,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryHospitalStore::new()),
            ClinicStores::in_memory(),
            mailer,
        )
    }

    pub fn validator(&self) -> Arc<dyn JwtValidator> {
        self.jwt.clone()
    }
}

/// Build services for the running process.
///
/// Credentials and hospitals go to Postgres when a database URL is set and
/// the `postgres` feature is compiled in; clinical records stay in memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let mailer = match &config.smtp {
        Some(smtp) => smtp_mailer(smtp)?,
        None => {
            tracing::warn!("APEXHMS_SMTP_HOST is not set; emails are written to the log only");
            Arc::new(LogMailer) as Arc<dyn Mailer>
        }
    };

    match &config.database_url {
        Some(url) => with_database(config, url, mailer).await,
        None => Ok(AppServices::in_memory(config.auth.clone(), mailer)?),
    }
}

#[cfg(feature = "smtp")]
fn smtp_mailer(settings: &SmtpSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    Ok(Arc::new(apexhms_infra::smtp::SmtpMailer::new(settings)?))
}

#[cfg(not(feature = "smtp"))]
fn smtp_mailer(_settings: &SmtpSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    tracing::warn!("APEXHMS_SMTP_HOST is set but smtp support is not compiled in; emails are written to the log only");
    Ok(Arc::new(LogMailer))
}

#[cfg(feature = "postgres")]
async fn with_database(config: &AppConfig, url: &str, mailer: Arc<dyn Mailer>) -> anyhow::Result<AppServices> {
    use apexhms_infra::store::postgres::{PostgresCredentialStore, PostgresHospitalStore, connect};

    let pool = connect(url).await?;
    tracing::info!("using postgres credential and hospital stores");
    Ok(AppServices::new(
        config.auth.clone(),
        Arc::new(PostgresCredentialStore::new(pool.clone())),
        Arc::new(PostgresHospitalStore::new(pool)),
        ClinicStores::in_memory(),
        mailer,
    )?)
}

#[cfg(not(feature = "postgres"))]
async fn with_database(config: &AppConfig, _url: &str, mailer: Arc<dyn Mailer>) -> anyhow::Result<AppServices> {
    tracing::warn!("APEXHMS_DATABASE_URL is set but postgres support is not compiled in; using memory stores");
    Ok(AppServices::in_memory(config.auth.clone(), mailer)?)
}
