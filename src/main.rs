mod api_doc;
mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod storage;
mod store;

use std::sync::Arc;

use anyhow::Context;
use config::Config;
use state::AppState;
use store::DictStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("cloud-dict starting");

    let config = Config::from_env()?;
    config.log_startup();

    let storage = storage::from_config(&config)?;
    let store = DictStore::new(storage.clone(), config.document_key.clone());

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let state = AppState {
        store,
        storage,
        config: Arc::new(config),
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
