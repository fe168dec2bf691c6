use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chroma_core::ColorCatalog;
use chroma_server::{
    config::Config, create_routes, registry::RoomRegistry, websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Chroma Party server...");

    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let catalog = match &config.color_catalog_path {
        Some(path) => {
            info!("Loading color catalog from {}", path);
            ColorCatalog::from_file(path)
        }
        None => ColorCatalog::builtin(),
    };
    let catalog = match catalog {
        Ok(catalog) => {
            info!("Loaded {} colors", catalog.len());
            catalog
        }
        Err(e) => {
            error!("Failed to load color catalog: {:#}", e);
            std::process::exit(1);
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let registry = match RoomRegistry::new(catalog, config.room_settings(), connection_manager.clone()) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to set up rooms: {:#}", e);
            std::process::exit(1);
        }
    };

    let routes = create_routes(connection_manager, registry.clone(), config.rate_limit());

    let host = match config.host.parse::<std::net::IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            error!("Invalid HOST {:?}: {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((host, config.port), shutdown_signal());

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;

    registry.shutdown().await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let (Ok(mut sigint), Ok(mut sigterm)) = (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) else {
            error!("Failed to install signal handlers");
            return std::future::pending().await;
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
            return std::future::pending().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
