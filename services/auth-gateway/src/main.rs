use std::sync::Arc;
use std::time::Duration;

use auth_gateway::config::GatewayConfig;
use auth_gateway::{build_router, AppState, SERVICE_NAME};
use common_token::load_secret;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = GatewayConfig::from_env();
    let addr = config.socket_addr()?;

    // The service cannot run without the shared secret; failing to read it
    // is fatal at startup rather than a runtime error.
    let secret = load_secret(&config.secret_path).map_err(|error| {
        format!(
            "failed to load secret key from {}: {error}",
            config.secret_path.display()
        )
    })?;

    tracing::info!(
        event = "service_start",
        service = SERVICE_NAME,
        version = VERSION,
        listen_addr = %addr,
        secret_path = %config.secret_path.display(),
        "starting service"
    );

    let state = Arc::new(AppState {
        secret: Arc::new(secret),
    });
    let router = build_router(state);

    let listener = TcpListener::bind(addr).await?;

    let drain = Arc::new(Notify::new());
    let drain_started = drain.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move { drain_started.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // The server only returns on its own if accepting failed.
            result??;
            return Ok(());
        }
        result = shutdown_signal() => {
            result?;
            tracing::info!(
                event = "shutdown_signal",
                service = SERVICE_NAME,
                "initiating graceful shutdown"
            );
        }
    }

    drain.notify_one();
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(
                service = SERVICE_NAME,
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, aborting open connections"
            );
            server.abort();
        }
    }

    tracing::info!(event = "service_stop", service = SERVICE_NAME);

    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
