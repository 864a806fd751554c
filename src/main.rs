mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{Config, RecordStoreBackend, StorageConfig};
use crate::core::error::AppError;
use crate::core::middleware;
use crate::features::records::store::{MemoryRecordStore, PgRecordStore, RecordStore};
use crate::features::records::{routes as records_routes, RecordService};
use crate::modules::storage::{LocalUploadStorage, MinIOClient, UploadStorage};
use axum::Router;
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}, form_variant={:?}",
        worker_threads,
        std::process::id(),
        config.app.form_variant
    );

    // The store connects on first use, so the app starts even while the
    // database is down.
    let store: Option<Arc<dyn RecordStore>> = match (config.record_store, &config.database) {
        (RecordStoreBackend::Memory, _) => {
            tracing::info!("Using in-memory record store");
            Some(Arc::new(MemoryRecordStore::new()))
        }
        (RecordStoreBackend::Postgres, Some(database)) => {
            tracing::info!("Using PostgreSQL record store at {}", database.redacted_url());
            Some(Arc::new(PgRecordStore::new(database.clone())))
        }
        (RecordStoreBackend::Postgres, None) => {
            tracing::warn!("DATABASE_URL is not set; record pages will report the database as unavailable");
            None
        }
    };

    let mut media_routes = Router::new();
    let uploads: Arc<dyn UploadStorage> = match &config.storage {
        StorageConfig::Local(local) => {
            if local.media_url.starts_with('/') {
                media_routes =
                    media_routes.nest_service(&local.media_url, ServeDir::new(&local.media_root));
            }
            tracing::info!(
                "Uploads stored under {} and served at {}",
                local.media_root.display(),
                local.media_url
            );
            Arc::new(LocalUploadStorage::new(local.clone()))
        }
        StorageConfig::MinIO(minio) => {
            let client = MinIOClient::new(minio.clone())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?;
            tracing::info!("Uploads stored in bucket: {}", client.bucket_name());
            Arc::new(client)
        }
    };

    let record_service = Arc::new(RecordService::new(
        store,
        uploads,
        config.app.form_variant,
    ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    async fn not_found() -> AppError {
        AppError::NotFound("The requested page does not exist".to_string())
    }

    let app = Router::new()
        .merge(records_routes(
            Arc::clone(&record_service),
            config.app.max_request_body_size,
        ))
        .merge(health_route)
        .merge(media_routes)
        .fallback(not_found)
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    record_service.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
