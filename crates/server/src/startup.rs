use axum::Router;
use configs::AppConfig;
use service::{store, ItemStore};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::ErrorDetail;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the store into handler state and build the router.
pub fn build_app(store: ItemStore, cfg: &AppConfig) -> Router {
    let state = AppState::new(store, ErrorDetail::from(cfg.server.expose_error_details));
    routes::build_router(state, build_cors())
}

/// Public entry: connect the backend once, then serve until the listener fails.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let backend = store::connect(&cfg.store).await?;
    let app = build_app(ItemStore::new(backend), &cfg);

    let listener = TcpListener::bind(cfg.bind_addr()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, table = %cfg.store.table_name, backend = ?cfg.store.backend, "starting items api");
    axum::serve(listener, app).await?;
    Ok(())
}
