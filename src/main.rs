use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use slidegen::config::{Settings, StorageBackend};
use slidegen::server::build_app_router;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    // Misconfiguration fails fast.
    let settings = Settings::from_env().expect("invalid configuration");
    if settings.storage_backend == StorageBackend::Memory {
        tracing::warn!("memory storage backend: published decks are lost on exit");
    }
    tracing::info!(
        backend = ?settings.storage_backend,
        bucket = %settings.presentations_bucket,
        staging = ?settings.staging_bucket,
        auth = settings.shared_secret.is_some(),
        "loaded configuration"
    );

    let state = settings.app_state().expect("failed to initialize storage");
    let app = build_app_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("shutdown complete");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "slidegen=info,tower_http=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
