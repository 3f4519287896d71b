//! BizVenture Kids daemon - JSON API for the learning app.

use std::path::PathBuf;

use anyhow::Result;
use bvk_common::config::Config;
use bvk_common::Store;
use bvkd::server::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("BizVenture daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let store = Store::open(&PathBuf::from(&config.database.path))?;
    info!("Database at {:?}", store.path());

    server::run(AppState::new(store, config)).await
}
