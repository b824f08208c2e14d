use std::sync::Arc;

use anyhow::anyhow;
use tokio::net::TcpListener;

use voice_diary_backend::interface::db::PostgresMoodStore;
use voice_diary_backend::interface::engine::HttpEmotionEngine;
use voice_diary_backend::interface::http::{self, AppState};
use voice_diary_backend::interface::identity::HttpIdentityVerifier;
use voice_diary_backend::interface::storage::S3AudioStore;
use voice_diary_backend::service::{MoodAnalyzer, MoodQueryService, UploadUrlIssuer};
use voice_diary_backend::shared::ports::audio_store::AudioStorePort;
use voice_diary_backend::shared::ports::emotion::EmotionEnginePort;
use voice_diary_backend::shared::ports::identity::IdentityPort;
use voice_diary_backend::shared::ports::mood_repository::MoodRepositoryPort;
use voice_diary_backend::shared::{config, logging};

/// Wires configuration, adapters and the HTTP surface, then serves until a
/// shutdown signal is received.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cfg = config::Config::from_env()?;
    let storage_cfg = config::StorageConfig::from_env()?;
    let identity_cfg = config::IdentityConfig::from_env()?;
    let engine_cfg = config::EngineConfig::from_env()?;
    let database_url = config::database_url().ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
    let timeouts = config::timeouts();

    let identity: Arc<dyn IdentityPort> = Arc::new(HttpIdentityVerifier::new(
        identity_cfg.verify_url,
        timeouts.identity_http,
    )?);
    let store: Arc<dyn AudioStorePort> =
        Arc::new(S3AudioStore::from_env(storage_cfg.bucket.clone()).await);
    let repository: Arc<dyn MoodRepositoryPort> =
        Arc::new(PostgresMoodStore::new(database_url).await?);
    let engine: Arc<dyn EmotionEnginePort> = Arc::new(HttpEmotionEngine::new(
        engine_cfg.base_url,
        timeouts.engine_http,
    ));

    let state = AppState {
        identity,
        issuer: Arc::new(UploadUrlIssuer::new(
            store.clone(),
            storage_cfg.upload_url_ttl,
        )),
        analyzer: Arc::new(MoodAnalyzer::new(
            store,
            engine,
            repository.clone(),
            storage_cfg.temp_dir,
        )),
        query: Arc::new(MoodQueryService::new(repository)),
    };

    let listener = TcpListener::bind(&cfg.http_bind_addr).await?;
    log::info!("[main] audio bucket: {}", storage_cfg.bucket);
    http::serve(listener, state).await?;

    Ok(())
}
