use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioStoreError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type AudioStoreFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, AudioStoreError>> + Send>>;

/// Object storage holding one audio blob per user per calendar date, keyed by
/// the `audio/{user_id}/{date_key}.{ext}` path convention.
pub trait AudioStorePort: Send + Sync {
    fn exists(&self, path: String) -> AudioStoreFuture<bool>;

    /// Downloads the blob at `path` into `local`. The caller owns the local
    /// file's lifecycle.
    fn download_to(&self, path: String, local: PathBuf) -> AudioStoreFuture<()>;

    /// Produces a write-only pre-authorized URL for a `PUT` of exactly
    /// `content_type` at `path`, valid for `expiry`. Grants no read or list
    /// access.
    fn presign_put(
        &self,
        path: String,
        content_type: String,
        expiry: Duration,
    ) -> AudioStoreFuture<String>;
}
