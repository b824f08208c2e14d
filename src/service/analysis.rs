//! analysis モジュール: 気分解析のオーケストレーション。
//! ダウンロード → 推論 → 正規化 → 保存 を1リクエスト内で逐次実行する。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::shared::entities::{DateKey, MoodRecord, UserId};
use crate::shared::error::ApiError;
use crate::shared::ports::audio_store::AudioStorePort;
use crate::shared::ports::emotion::EmotionEnginePort;
use crate::shared::ports::mood_repository::MoodRepositoryPort;

pub struct MoodAnalyzer {
    store: Arc<dyn AudioStorePort>,
    engine: Arc<dyn EmotionEnginePort>,
    repository: Arc<dyn MoodRepositoryPort>,
    temp_dir: PathBuf,
}

impl MoodAnalyzer {
    pub fn new(
        store: Arc<dyn AudioStorePort>,
        engine: Arc<dyn EmotionEnginePort>,
        repository: Arc<dyn MoodRepositoryPort>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            engine,
            repository,
            temp_dir,
        }
    }

    /// Runs the full pipeline for one blob and returns the persisted record.
    ///
    /// Re-running for the same `storage_path` overwrites the same
    /// (user, date) record, so callers may retry a failed analysis freely.
    /// The scoped temp file is removed on every exit path.
    pub async fn analyze(
        &self,
        user_id: &UserId,
        storage_path: Option<&str>,
    ) -> Result<MoodRecord, ApiError> {
        let storage_path = storage_path
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::InvalidArgument("Storage path is required".to_string()))?;
        let date_key = derive_date_key(storage_path)?;

        let request_id = Uuid::new_v4();
        log::info!(
            "[analysis] start request_id={} user={} path={}",
            request_id,
            user_id,
            storage_path
        );

        if !self.store.exists(storage_path.to_string()).await? {
            return Err(ApiError::NotFound(
                "Audio file not found in storage".to_string(),
            ));
        }

        // 一時ファイルは Drop で削除される（成功・失敗どちらの経路でも）
        let temp = tempfile::Builder::new()
            .prefix("mood-")
            .suffix(&temp_suffix(storage_path))
            .tempfile_in(&self.temp_dir)
            .map_err(|err| ApiError::Internal(format!("temp file unavailable: {}", err)))?;
        let local = temp.path().to_path_buf();

        self.store
            .download_to(storage_path.to_string(), local.clone())
            .await?;
        log::info!(
            "[analysis] downloaded request_id={} to {}",
            request_id,
            local.display()
        );

        let outcome = self.engine.infer(local).await.map_err(ApiError::from)?;

        let record = MoodRecord::from_inference(
            user_id.clone(),
            date_key,
            storage_path.to_string(),
            outcome.category,
            outcome.intensity,
        );
        log::info!(
            "[analysis] inferred request_id={} date={} category={} intensity={} score={}",
            request_id,
            record.date_key,
            record.category,
            record.intensity,
            record.score
        );

        self.repository
            .upsert(record.clone())
            .await
            .map_err(ApiError::from)?;
        log::info!(
            "[analysis] saved request_id={} user={} date={}",
            request_id,
            record.user_id,
            record.date_key
        );

        Ok(record)
    }
}

/// ストレージパスから日付キーを導出（basename から拡張子を除いたもの）。
/// クライアントが別途申告した日付は一切信用しない。
fn derive_date_key(storage_path: &str) -> Result<DateKey, ApiError> {
    let basename = storage_path.rsplit('/').next().unwrap_or(storage_path);
    let stem = basename.split('.').next().unwrap_or(basename);
    DateKey::new(stem).map_err(|_| {
        ApiError::InvalidArgument(format!(
            "Storage path does not encode a date key: {}",
            storage_path
        ))
    })
}

fn temp_suffix(storage_path: &str) -> String {
    match Path::new(storage_path).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => ".m4a".to_string(),
    }
}
