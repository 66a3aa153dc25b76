use std::sync::Arc;

use mongodb::{Client, Database};

use crate::config::AppConfig;
use crate::database::{memory::MemoryStore, mongo::MongoStore, ScoringStore};
use crate::errors::{AppError, Result};

pub async fn get_db_client(database_url: &str, db_name: &str) -> Result<Database> {
    let client = Client::with_uri_str(database_url).await?;
    let db = client.database(db_name);

    // Verify database is reachable by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("✅ Connected to database: {}", db_name);
            tracing::info!("📂 Collections found: {:?}", collections);

            if !collections.iter().any(|c| c == "innings") {
                tracing::warn!("⚠️ 'innings' collection not found; it will be created on first write");
            }
        }
        Err(e) => {
            tracing::error!("❌ Database '{}' may not exist or is inaccessible: {}", db_name, e);
            return Err(AppError::MongoDB(e));
        }
    }

    Ok(db)
}

/// MongoDB when a URL is configured, otherwise an in-memory store.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn ScoringStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let db = get_db_client(url, &config.database_name).await?;
            let store = MongoStore::new(db);
            store.ensure_indexes().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; scores are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
