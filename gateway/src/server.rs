//! Server setup and lifecycle for the Innkeep gateway.

use std::net::SocketAddr;
use std::sync::Arc;

use config::{Config, Validate};
use errors::ReservationError;
use notify::{LogNotifier, SmtpNotifier};
use reservations::ReservationManager;
use storage::PostgresStore;
use tokio::net::TcpListener;
use tokio::signal;

use crate::auth::TokenVerifier;
use crate::routes::create_router;
use crate::state::AppState;

/// Builds the application state from configuration: PostgreSQL-backed
/// catalogs and store, the notifier selected by the SMTP settings, and
/// the token verifier.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>, ReservationError> {
    config
        .validate()
        .map_err(|e| ReservationError::Internal {
            reason: format!("invalid configuration: {e}")
        })?;

    let store = Arc::new(PostgresStore::connect(&config.database.url).await?);
    store.initialize_schema().await?;

    let mut manager = ReservationManager::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone()
    );

    manager = if config.smtp.enabled {
        let smtp = SmtpNotifier::new(
            &config.smtp.server,
            config.smtp.port,
            config.smtp.username.clone(),
            config.smtp.password.clone(),
            &config.smtp.from
        )
        .map_err(|e| ReservationError::Internal {
            reason: format!("SMTP setup failed: {e}")
        })?;
        manager.with_notifier(Arc::new(smtp))
    } else {
        manager.with_notifier(Arc::new(LogNotifier::new()))
    };

    let verifier = TokenVerifier::new(&config.auth.jwt_secret);
    Ok(Arc::new(AppState::new(manager, verifier)))
}

/// Runs the HTTP server until Ctrl+C or SIGTERM.
pub async fn run_server(config: Config) -> Result<(), ReservationError> {
    let state = build_state(&config).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ReservationError::Internal {
            reason: format!("invalid bind address: {e}")
        })?;

    let router = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ReservationError::Internal {
            reason: format!("failed to bind to {addr}: {e}")
        })?;

    tracing::info!(%addr, "Innkeep gateway starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ReservationError::Internal {
            reason: format!("server error: {e}")
        })?;

    tracing::info!("Innkeep gateway stopped");
    Ok(())
}

/// Entry point for containerized deployments: tracing from
/// `RUST_LOG`, configuration from `INNKEEP_*` environment variables.
pub async fn run_from_env() -> Result<(), ReservationError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    let config = config::load_from_env();
    run_server(config).await
}

/// Signal handler for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
