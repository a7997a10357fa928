//! JSON feeder - Entry Point
//!
//! Accepts uploaded JSON files, stores them under the configured root and
//! indexes their records in Redis.

use std::sync::Arc;

use log::{error, info};

use json_feeder::Server;
use json_feeder::bootstrap::prepare_storage;
use json_feeder::config::AppConfig;
use json_feeder::error::FeederError;
use json_feeder::ingest::{EmbeddingModel, HashingEmbedder, RedisVectorStore};
use json_feeder::storage::FileSystemStorageService;

#[tokio::main]
async fn main() {
    // env_logger picks up RUST_LOG, defaulting to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("JSON feeder failed to start: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), FeederError> {
    info!("Launching JSON feeder...");

    let config = AppConfig::load()?;
    let embedder: Arc<dyn EmbeddingModel> =
        Arc::new(HashingEmbedder::new(config.vectorstore.dimensions)?);
    let vector_store = Arc::new(RedisVectorStore::new(&config.vectorstore, embedder)?);
    let storage = Arc::new(FileSystemStorageService::new(&config.storage, vector_store)?);

    prepare_storage(storage.as_ref(), &config.storage)?;

    let server = Server::bind(config.server, storage).await?;
    server.start().await;
    Ok(())
}
