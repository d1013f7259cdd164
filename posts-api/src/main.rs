use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::blog_service::BlogService;
use infrastructure::database::connect_store;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let store = connect_store(&settings).await?;
    let state = AppState::new(Arc::new(BlogService::new(store.clone())));

    let served = server::run_http(&settings, state).await;

    store.close().await;
    info!("post store connection closed");
    served
}
