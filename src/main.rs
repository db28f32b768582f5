//! Ares backend HTTP server.
//!
//! Reads configuration from `$ARES_CONFIG` or
//! `~/.config/ares-backend/config.toml`, then environment overrides.

use tracing::{error, info, warn};

use ares_backend::config::AppConfig;
use ares_backend::config_path_from_env;
use ares_backend::server::{init_tracing, ServerHandle, ServerOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config_path = config_path_from_env();
    let (config, load_error) = match AppConfig::load_with_env(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }
    for problem in config.validate() {
        warn!("Config: {}", problem);
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        seed_admin: true,
    })
    .await?;
    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully");

    handle.wait().await;
    Ok(())
}
