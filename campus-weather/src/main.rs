use campus_weather::config::Config;
use common::tracing::init_tracing_for;
use std::net::SocketAddr;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_tracing_for(&config.log_format);

    let cancellation_token = CancellationToken::new();
    let state = campus_weather::build_state(&config, cancellation_token.clone())?;
    let app = campus_weather::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        ttl_seconds = config.cache_ttl_seconds,
        dedupe_in_flight = config.dedupe_in_flight,
        "Campus weather service starting on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancellation_token))
        .await?;

    info!("Campus weather service stopped");
    Ok(())
}

async fn shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    // Stop overview tasks still waiting on the provider
    cancellation_token.cancel();
    warn!("Cancelled in-flight requests, shutting down gracefully...");
}
