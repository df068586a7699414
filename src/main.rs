use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;

use bh::api;
use bh::api::AppState;
use bh::config::Config;
use bh::store::PgStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure tracing subscriber
    let filter = env::var("BH_LOG").unwrap_or(String::from("bh=info,tower_http=info"));
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(filter)
        .finish();

    let _guard = tracing::subscriber::set_global_default(subscriber);

    api::install_panic_hook();

    tracing::info!("starting bh v{VERSION}");
    if cfg!(feature = "test-utilities") {
        tracing::warn!("build includes test-utilities, use cargo's `--no-default-features` flag");
    } else {
        tracing::debug!("compiled without test-utilities");
    }

    let config = Config::load()?;
    tracing::debug!("using config {config:?}");

    let store = PgStore::connect(&config.postgres)?;
    let state = AppState::new(
        Arc::new(store),
        config.timeout,
        tracing::info_span!("api"),
    );
    let app = api::router(state, config.log_http);

    let listener = TcpListener::bind(&config.http_address).await?;
    tracing::info!("listening on {}", &config.http_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("exiting");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("captured ctrl-c"),
        _ = terminate => tracing::info!("captured SIGTERM"),
    }
}
