use admin_service::{build_router, config::AdminConfig, services::metrics::init_metrics, AppState};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use tokio::signal;

#[tokio::main]
async fn main() {
    // Configuration errors are reported before logging exists
    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.log_format,
        config.otlp_endpoint.as_deref(),
    );

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Service terminated with error");
        std::process::exit(1);
    }
}

async fn run(config: AdminConfig) -> Result<(), service_core::error::AppError> {
    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder unavailable");
            None
        }
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        kratos_admin_url = %config.kratos.admin_url,
        kratos_public_url = ?config.kratos.public_url,
        "Starting admin service"
    );

    let state = AppState::new(config.clone(), metrics)?;
    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Listening");

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
