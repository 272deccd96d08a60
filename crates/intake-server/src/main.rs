//! `intake-server` binary

use anyhow::Context;
use intake_core::ResponseRecorder;
use intake_server::{command, Invocation, LogFormat, Mode, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,intake=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command().get_matches();
    let invocation = Invocation::from_matches(&matches);

    let config = ServerConfig::load(invocation.config_path.as_deref(), invocation.overrides)
        .context("failed to load configuration")?;
    init_tracing(config.log_format);
    tracing::debug!("Loaded {:?}", config);

    let store = config
        .build_store()
        .context("failed to set up spreadsheet backend")?;
    tracing::info!("Using {} backend", store.name());
    let recorder = Arc::new(ResponseRecorder::new(config.recorder_config(), store));

    match invocation.mode {
        Mode::Migrate => migrate(&recorder).await,
        Mode::Serve => serve(&config, recorder).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn migrate(recorder: &ResponseRecorder) -> anyhow::Result<()> {
    let report = recorder
        .migrate_schema()
        .await
        .context("schema migration failed")?;
    if report.seeded {
        tracing::info!("Seeded header row in '{}'", report.sheet.title);
    } else if report.added.is_empty() {
        tracing::info!("Header row in '{}' is up to date", report.sheet.title);
    } else {
        tracing::info!(
            "Added {} headers to '{}': {:?}",
            report.added.len(),
            report.sheet.title,
            report.added
        );
    }
    Ok(())
}

async fn serve(config: &ServerConfig, recorder: Arc<ResponseRecorder>) -> anyhow::Result<()> {
    if config.spreadsheet_id.is_configured() {
        if let Err(e) = migrate(&recorder).await {
            tracing::warn!("{:#}; serving anyway", e);
        }
    } else {
        tracing::warn!(
            "Spreadsheet id is not configured; submissions will fail until \
             INTAKE_SPREADSHEET_ID is set"
        );
    }

    let routes = intake_server::routes(recorder, config.max_body_bytes);
    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.bind, shutdown_signal())
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!("Listening on http://{}", addr);
    server.await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
