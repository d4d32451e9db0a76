use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use government_lookup_server::config::load_config;
use government_lookup_server::core::error::AppError;
use government_lookup_server::core::seed::load_seed;
use government_lookup_server::core::store::Store;
use government_lookup_server::features::register_references;
use government_lookup_server::server::{AppState, build_router};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = load_config()?;

    let sled_db = sled::open(&config.db_path).map_err(|err| {
        AppError::internal(format!(
            "failed to open sled database at {}: {err}",
            config.db_path
        ))
    })?;
    let store = register_references(Store::new(sled_db));

    if let Some(seed_path) = &config.seed_path {
        load_seed(&store, seed_path).await?;
    }

    let app = build_router(AppState::from_store(&store)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "starting server");
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::internal(format!("failed to bind: {err}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|err| AppError::internal(format!("server error: {err}")))?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
