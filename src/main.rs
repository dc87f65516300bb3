#![cfg(not(tarpaulin_include))]

use research_portal::PortalConfig;
use research_portal::app;
use std::env;

/// Main entry point for the research portal web application
///
/// # Arguments
/// * `data_dir` - Directory holding the `.xlsx` files (default `.`)
/// * `bind_addr` - Address to listen on (default `127.0.0.1:3000`)
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PortalConfig::from_args(env::args());
    log::info!(
        "Starting research portal for {} addresses in {}",
        config.email_domain,
        config.data_dir.display()
    );

    app::run(config).await
}
