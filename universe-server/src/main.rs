//! Universe materialization & streaming engine — HTTP/WS entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod db;
mod error;
mod routes;
mod state;
mod tracing_logger;

use config::Config;
use db::{Database, PostgresSovereignSource};
use state::AppState;
use universe_core::tiered::TieredBuilder;
use universe_core::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_logger::init_subscriber();

    let config = Config::from_env()?;
    info!(host = %config.server.host, port = config.server.port, "loaded configuration");

    let db = Database::new(&config.database).await?;
    db.run_migrations().await?;
    info!("applied universe_assets schema");

    let sovereign = Box::new(PostgresSovereignSource::new(&db));
    let builder = TieredBuilder::with_params(
        sovereign,
        0xC0FFEE,
        3,
        Duration::from_secs(30),
        Duration::from_millis(config.engine.circuit_breaker_deadline_ms),
    );

    let engine = Engine::new(
        config.engine.materializer_workers as usize * 1024,
        builder,
        config.engine.enable_voidpool,
    );

    let state = AppState { engine: Arc::new(engine), db: Arc::new(db), config: Arc::new(config.clone()) };

    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "universe-server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
