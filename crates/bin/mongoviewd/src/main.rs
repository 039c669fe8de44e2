//! Daemon entry point for the mongoview browser.
//!
//! Loads configuration from the environment, connects to the database (refusing
//! to start if it is unreachable), and serves the browse routes over HTTP.

mod config;

use mongoview_core::services::StoreHandle;
use mongoview_http::{BrowseServer, BrowseServerConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::MongoviewConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = MongoviewConfig::from_args()?;

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(addr = %config.listen_addr, "starting mongoviewd");
    let handle = StoreHandle::connect_mongo(&config.store_settings()).await?;

    let server_config =
        BrowseServerConfig::new(config.listen_addr).with_request_timeout(config.request_timeout);
    BrowseServer::new(&handle, server_config).serve().await
}
