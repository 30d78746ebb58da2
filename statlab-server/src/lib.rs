//! StatLab HTTP transport
//!
//! A thin axum layer over the analyzers in `statlab-stats`. Every route is
//! stateless: the upload is parsed per request, one analysis runs, and
//! the result (or a structured `{"error": ...}` object) is serialized
//! back. CORS and the bind address are explicit configuration handed to
//! the entry point, not globals.

pub mod http;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    /// Allow any origin (development default; the API carries no
    /// credentials).
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
            permissive_cors: true,
        }
    }
}

impl ServerConfig {
    /// Read configuration from `STATLAB_ADDR` / `STATLAB_CORS` with the
    /// defaults above.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: std::env::var("STATLAB_ADDR").unwrap_or(defaults.addr),
            permissive_cors: std::env::var("STATLAB_CORS")
                .map(|v| v != "off")
                .unwrap_or(defaults.permissive_cors),
        }
    }
}

/// Create the API router.
pub fn create_router(config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(http::health))
        .route("/analyze", post(http::analyze))
        .route("/get_data", post(http::get_data))
        .route("/clean", post(http::clean))
        .route("/regress", post(http::regress))
        .route("/logistic", post(http::logistic))
        .route("/hypothesis", post(http::hypothesis))
        .route("/distribution", post(http::distribution))
        .route("/transform", post(http::transform))
        .route("/diagnostics", post(http::diagnostics))
        // Legacy route name used by the existing client
        .route("/phase4_diagnostics", post(http::diagnostics))
        .route("/compare", post(http::compare))
        .route("/power", post(http::power))
        .layer(TraceLayer::new_for_http());

    if config.permissive_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(&config);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!(addr = %config.addr, "statlab server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
