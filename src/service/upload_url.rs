//! upload_url モジュール: 音声アップロード用の署名付きURL発行。
//! パス規約 `audio/{user_id}/{date}.{ext}` はここでしか組み立てない。

use std::sync::Arc;
use std::time::Duration;

use crate::shared::entities::{DateKey, UserId};
use crate::shared::error::ApiError;
use crate::shared::ports::audio_store::AudioStorePort;

const DEFAULT_CONTENT_TYPE: &str = "audio/m4a";

/// Supported upload MIME types and the storage-path extension each one maps
/// to. Anything outside this table is rejected up front instead of being
/// silently written under a wrong extension.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "audio/m4a" | "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        "audio/aac" => Some("aac"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct IssuedUpload {
    pub upload_url: String,
    pub storage_path: String,
}

pub struct UploadUrlIssuer {
    store: Arc<dyn AudioStorePort>,
    url_ttl: Duration,
}

impl UploadUrlIssuer {
    pub fn new(store: Arc<dyn AudioStorePort>, url_ttl: Duration) -> Self {
        Self { store, url_ttl }
    }

    /// Issues a time-limited write-only upload URL bound to the deterministic
    /// storage path for (`user_id`, `date`). No blob or record is created
    /// here; the URL is the only side effect handed out.
    pub async fn issue(
        &self,
        user_id: &UserId,
        date: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<IssuedUpload, ApiError> {
        let date = date
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::InvalidArgument("Date is required".to_string()))?;
        let date = DateKey::new(date)?;

        let content_type = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let ext = extension_for(content_type).ok_or_else(|| {
            ApiError::InvalidArgument(format!("Unsupported content type: {}", content_type))
        })?;

        let storage_path = format!("audio/{}/{}.{}", user_id.as_str(), date.as_str(), ext);

        let upload_url = self
            .store
            .presign_put(storage_path.clone(), content_type.to_string(), self.url_ttl)
            .await
            .map_err(|err| {
                log::error!("[upload_url] presign failed for {}: {}", storage_path, err);
                ApiError::Internal(format!("Failed to generate upload URL: {}", err))
            })?;

        log::info!(
            "[upload_url] issued path={} content_type={} ttl={}s",
            storage_path,
            content_type,
            self.url_ttl.as_secs()
        );

        Ok(IssuedUpload {
            upload_url,
            storage_path,
        })
    }
}
