use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapread::api::{create_router, AppState};
use snapread::config::Config;
use snapread::ocr::{OcrApi, VisionClient};
use snapread::storage::{BlobImageStore, ImageStore};

#[derive(Parser)]
#[command(name = "snapread")]
#[command(about = "Self-hostable image-to-text service backed by an async OCR API")]
struct Args {
    /// Bind address override (otherwise SNAPREAD_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port override (otherwise SNAPREAD_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapread=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let store: Arc<dyn ImageStore> = Arc::new(BlobImageStore::new(&config.storage)?);
    let ocr: Arc<dyn OcrApi> = Arc::new(VisionClient::new(&config.vision)?);

    if config.origins.allowed.is_empty() {
        tracing::warn!(
            "ALLOWED_ORIGINS is not set — every browser cross-origin request will be rejected. Non-browser callers are unaffected."
        );
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, ocr);
    let app = create_router(state);

    tracing::info!("snapread starting on http://{}", addr);
    tracing::info!("  Recognize:    POST http://{}/api/v1/recognize", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
