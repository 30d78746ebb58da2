//! StatLab Server Binary
//!
//! Stateless HTTP server over the statistical analysis engine.

use statlab_server::{serve, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    serve(ServerConfig::from_env()).await
}
