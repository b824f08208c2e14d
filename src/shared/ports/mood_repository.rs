use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::shared::entities::{DateKey, MoodHistoryEntry, MoodRecord, UserId};

#[derive(Debug, Error)]
pub enum MoodRepositoryError {
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
}

pub type MoodRepositoryFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, MoodRepositoryError>> + Send>>;

/// Per-user, per-date keyed store for mood records. Writes are last-write-wins
/// upserts keyed by `(user_id, date_key)`; the store's own per-row atomicity
/// is the only locking required.
pub trait MoodRepositoryPort: Send + Sync {
    fn upsert(&self, record: MoodRecord) -> MoodRepositoryFuture<()>;

    /// All records owned by `user_id` whose date key lies in `[start, end]`
    /// inclusive. No ordering guarantee.
    fn list_range(
        &self,
        user_id: UserId,
        start: DateKey,
        end: DateKey,
    ) -> MoodRepositoryFuture<Vec<MoodHistoryEntry>>;
}
