use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use rasp::config::Config;
use rasp::server::TimetableServer;
use rasp::storage::FileStore;

/// Start the timetable server
pub async fn serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    public_dir: Option<PathBuf>,
) -> Result<()> {
    if host.is_some() || port.is_some() {
        let host = host.unwrap_or_else(|| config.server.bind_address.ip().to_string());
        let port = port.unwrap_or_else(|| config.server.bind_address.port());
        config.server.bind_address = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .context("Invalid bind address")?;
    }
    if public_dir.is_some() {
        config.server.public_dir = public_dir;
    }

    let store = Arc::new(FileStore::new(&config.storage.data_dir));
    let server = TimetableServer::new(&config, store).context("Failed to create server")?;

    println!("{}", server.info().display());
    println!("  Data Dir: {}", config.storage.data_dir.display());
    println!();
    println!("API Endpoints:");
    println!("  GET  /health                - Health check");
    println!("  GET  /api/groups            - List all groups");
    println!("  GET  /api/staff             - List all staff members");
    println!("  GET  /api/search?q=         - Search groups and staff");
    println!("  GET  /api/schedule          - Cached schedule (groupId|staffId, week)");
    println!("  POST /api/refresh-schedule  - Refresh (url | staffId | groupId, week)");
    println!();
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Timetable server stopped.");
    Ok(())
}
