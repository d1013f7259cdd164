use std::sync::Arc;

use anyhow::{Context, Result};
use mongodb::Client;
use mongodb::bson::doc;
use tracing::{info, warn};

use crate::data::post_repository::PostRepository;
use crate::data::repositories::memory::post_repository::InMemoryPostRepository;
use crate::data::repositories::mongo::post_repository::MongoPostRepository;
use crate::infrastructure::settings::{Settings, StoreUrl};

const DEFAULT_DATABASE: &str = "blog";

/// Opens the configured store and verifies it answers before serving.
pub(crate) async fn connect_store(settings: &Settings) -> Result<Arc<dyn PostRepository>> {
    match &settings.database_url {
        StoreUrl::Memory => {
            warn!("using in-memory post store, data is lost on shutdown");
            Ok(Arc::new(InMemoryPostRepository::new()))
        }
        StoreUrl::Mongo(url) => {
            let client = Client::with_uri_str(url)
                .await
                .context("failed to parse MongoDB connection string")?;

            let database = match &settings.database_name {
                Some(name) => client.database(name),
                None => client
                    .default_database()
                    .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
            };

            database
                .run_command(doc! { "ping": 1 })
                .await
                .context("MongoDB did not answer ping")?;

            let repo = MongoPostRepository::new(client, &database);
            repo.ensure_indexes()
                .await
                .context("failed to create post indexes")?;

            info!(database = %database.name(), "connected to MongoDB");
            Ok(Arc::new(repo))
        }
    }
}
