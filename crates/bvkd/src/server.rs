//! HTTP server setup and shared state.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use axum::Router;
use bvk_common::config::Config;
use bvk_common::Store;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;
use crate::sessions::SessionMap;

/// Shared application state
pub struct AppState {
    pub store: Store,
    pub sessions: SessionMap,
    pub config: Config,
    /// Economy draws and certificate suffixes; seeded from config when
    /// `economy.rng_seed` is set
    pub rng: Mutex<StdRng>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        let rng = match config.economy.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            sessions: SessionMap::new(config.session.ttl_minutes),
            config,
            rng: Mutex::new(rng),
            start_time: Instant::now(),
        }
    }
}

/// Build the full router. Tests drive this directly with `oneshot`.
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .merge(routes::account_routes())
        .merge(routes::parent_routes())
        .merge(routes::curriculum_routes())
        .merge(routes::scenario_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let app = router(state);

    info!("Starting BizVenture API server");
    info!("  Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
