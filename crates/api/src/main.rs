use std::sync::Arc;

use anyhow::Context;

use apexhms_api::app::{self, services};
use apexhms_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    apexhms_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(services::build_services(&config).await?);

    if let Some(seed) = &config.super_admin {
        services
            .accounts
            .seed_super_admin(&seed.email, &seed.password)
            .await
            .context("failed to seed the super-admin")?;
    }

    let router = app::build_app(services.clone(), services.validator());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
