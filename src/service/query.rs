//! query モジュール: 週次グラフ用の気分履歴取得。

use std::sync::Arc;

use crate::shared::entities::{DateKey, MoodHistoryEntry, UserId};
use crate::shared::error::ApiError;
use crate::shared::ports::mood_repository::MoodRepositoryPort;

#[derive(Clone, Debug)]
pub struct MoodHistory {
    pub records: Vec<MoodHistoryEntry>,
    pub count: usize,
}

pub struct MoodQueryService {
    repository: Arc<dyn MoodRepositoryPort>,
}

impl MoodQueryService {
    pub fn new(repository: Arc<dyn MoodRepositoryPort>) -> Self {
        Self { repository }
    }

    /// Returns the user's records with date keys in `[start_date, end_date]`
    /// inclusive. An inverted range is not an error; it is simply empty.
    /// Ordering of the returned records is unspecified.
    pub async fn query(
        &self,
        user_id: &UserId,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<MoodHistory, ApiError> {
        let (start, end) = match (non_empty(start_date), non_empty(end_date)) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(ApiError::InvalidArgument(
                    "Start date and end date are required".to_string(),
                ))
            }
        };
        let start = DateKey::new(start)?;
        let end = DateKey::new(end)?;

        let records = self
            .repository
            .list_range(user_id.clone(), start, end)
            .await
            .map_err(|err| {
                log::error!("[query] range read failed for user {}: {}", user_id, err);
                ApiError::Internal(format!("Failed to get mood data: {}", err))
            })?;

        let count = records.len();
        Ok(MoodHistory { records, count })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
