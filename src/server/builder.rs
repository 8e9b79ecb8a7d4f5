//! Server bootstrap

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use tracing::info;

/// Run the server with configuration loaded from the environment
pub async fn run_server() -> Result<()> {
    info!("Starting healthgate");

    let config = Config::from_env()?;

    let server = HttpServer::new(&config).await?;
    info!(
        "Server starting at http://{}:{}",
        config.server.host, config.server.port
    );
    info!("Endpoints:");
    info!("   GET  /health               - Basic health (system + database)");
    info!("   GET  /health/comprehensive - Full report over all components");
    info!("   GET  /health/metrics       - Prometheus exposition");

    server.start().await
}
