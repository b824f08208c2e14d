use chrono::{DateTime, Utc};

use super::identifiers::{DateKey, UserId};

/// 収録ポリシーのタグ。現状は毎日20時(JST)の1本録りのみ。
pub const MOOD_SOURCE: &str = "daily_20_jst";

/// Pipeline version tag, bumped when the inference pipeline changes
/// incompatibly. 2 = the ML-model revision.
pub const PIPELINE_VERSION: i32 = 2;

/// One mood record per (user, calendar date). Overwritten wholesale on
/// re-analysis of the same date.
#[derive(Clone, Debug)]
pub struct MoodRecord {
    pub user_id: UserId,
    pub date_key: DateKey,
    pub category: String,
    pub intensity: f64,
    pub score: f64,
    pub storage_path: String,
    pub source: String,
    pub recorded_at: DateTime<Utc>,
    pub version: i32,
}

impl MoodRecord {
    /// Builds a record from raw engine output. `score` is always the clamped
    /// intensity and `recorded_at` is always assigned here, server-side.
    pub fn from_inference(
        user_id: UserId,
        date_key: DateKey,
        storage_path: String,
        category: String,
        intensity: f64,
    ) -> Self {
        Self {
            user_id,
            date_key,
            category,
            intensity,
            score: normalize_score(intensity),
            storage_path,
            source: MOOD_SOURCE.to_string(),
            recorded_at: Utc::now(),
            version: PIPELINE_VERSION,
        }
    }
}

/// 感情強度を -1〜1 の範囲に正規化
pub fn normalize_score(intensity: f64) -> f64 {
    intensity.clamp(-1.0, 1.0)
}

/// Read-model row returned by range queries. `recorded_at` is `None` for
/// records that predate server timestamping.
#[derive(Clone, Debug)]
pub struct MoodHistoryEntry {
    pub date: String,
    pub score: f64,
    pub category: String,
    pub intensity: f64,
    pub recorded_at: Option<DateTime<Utc>>,
}
