use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use reelforge_workflow::TaskRegistry;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod routes_api;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub registry: Arc<TaskRegistry>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(registry: Arc<TaskRegistry>, config: Config) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes_api::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // SPA fallback: unknown paths serve index.html
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server and run until Ctrl-C or SIGTERM.
pub async fn start_server(config: Config, registry: Arc<TaskRegistry>) -> Result<()> {
    serve_until(config, registry, shutdown_signal()).await
}

/// Serve until `shutdown` resolves, then drain open connections.
pub async fn serve_until<F>(config: Config, registry: Arc<TaskRegistry>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let static_dir = config.server.static_dir.clone();
    let app = create_router(AppContext::new(registry, config), static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on the first of Ctrl-C or, on unix, SIGTERM.
///
/// A handler that cannot be installed never fires, so the other one still
/// stops the server.
async fn shutdown_signal() {
    #[cfg(unix)]
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| tracing::error!("SIGTERM handler unavailable: {}", e))
        .ok();

    let terminated = async {
        #[cfg(unix)]
        if let Some(stream) = sigterm.as_mut() {
            stream.recv().await;
            return "SIGTERM";
        }
        std::future::pending::<&str>().await
    };

    let interrupted = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
        "Ctrl-C"
    };

    let received = tokio::select! {
        name = interrupted => name,
        name = terminated => name,
    };
    tracing::info!("{} received, draining connections", received);
}
