// Visa Tracker - Web Server
// REST API with Axum, static frontend served from the public directory

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use visa_tracker::{
    routes::{router, AppState},
    Config, NarrativeAgent, StageCatalog, TimelineService, VisaStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load().context("Failed to load configuration")?;

    let catalog = match &config.timeline_path {
        Some(path) => {
            info!(path = %path.display(), "Loading timeline catalog");
            StageCatalog::from_path(path).context("Failed to load timeline catalog")?
        }
        None => StageCatalog::default(),
    };

    let store = VisaStore::new(&config.record_path, &config.history_path);
    if !store.record_path().exists() {
        tracing::warn!(
            path = %store.record_path().display(),
            "Visa record not found, run `visa-tracker seed` to create it"
        );
    }

    let agent = NarrativeAgent::from_config(config.gemini());
    let state = AppState::new(
        store,
        TimelineService::new(catalog),
        agent,
        config.bulletin_path.clone(),
    );

    let app = router(state, Some(config.public_dir.as_path()));

    let address = config.address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    info!("Immigration tracker listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
