//! Mood Record Store の Postgres 実装。
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE mood_records (
//!     user_id      TEXT NOT NULL,
//!     date_key     TEXT NOT NULL,
//!     category     TEXT NOT NULL,
//!     intensity    DOUBLE PRECISION NOT NULL,
//!     score        DOUBLE PRECISION NOT NULL,
//!     storage_path TEXT NOT NULL,
//!     source       TEXT NOT NULL,
//!     recorded_at  TIMESTAMPTZ,
//!     version      INTEGER NOT NULL,
//!     PRIMARY KEY (user_id, date_key)
//! );
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::shared::entities::{DateKey, MoodHistoryEntry, MoodRecord, UserId};
use crate::shared::ports::mood_repository::{
    MoodRepositoryError, MoodRepositoryFuture, MoodRepositoryPort,
};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_CONNECTIONS: u32 = 5;

pub struct PostgresMoodStore {
    pool: PgPool,
}

impl PostgresMoodStore {
    pub async fn new(database_url: String) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&database_url)
            .await?;
        Ok(Self { pool })
    }

    async fn upsert_inner(pool: &PgPool, record: MoodRecord) -> Result<(), MoodRepositoryError> {
        sqlx::query(
            "INSERT INTO mood_records
                 (user_id, date_key, category, intensity, score, storage_path,
                  source, recorded_at, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (user_id, date_key) DO UPDATE SET
                 category = EXCLUDED.category,
                 intensity = EXCLUDED.intensity,
                 score = EXCLUDED.score,
                 storage_path = EXCLUDED.storage_path,
                 source = EXCLUDED.source,
                 recorded_at = EXCLUDED.recorded_at,
                 version = EXCLUDED.version",
        )
        .bind(record.user_id.as_str())
        .bind(record.date_key.as_str())
        .bind(&record.category)
        .bind(record.intensity)
        .bind(record.score)
        .bind(&record.storage_path)
        .bind(&record.source)
        .bind(record.recorded_at)
        .bind(record.version)
        .execute(pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn list_range_inner(
        pool: &PgPool,
        user_id: UserId,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<MoodHistoryEntry>, MoodRepositoryError> {
        let rows = sqlx::query(
            "SELECT date_key, score, category, intensity, recorded_at
             FROM mood_records
             WHERE user_id = $1 AND date_key >= $2 AND date_key <= $3",
        )
        .bind(user_id.as_str())
        .bind(start.as_str())
        .bind(end.as_str())
        .fetch_all(pool)
        .await
        .map_err(map_read_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(MoodHistoryEntry {
                date: row.try_get("date_key").map_err(map_read_err)?,
                score: row.try_get("score").map_err(map_read_err)?,
                category: row.try_get("category").map_err(map_read_err)?,
                intensity: row.try_get("intensity").map_err(map_read_err)?,
                recorded_at: row
                    .try_get::<Option<DateTime<Utc>>, _>("recorded_at")
                    .map_err(map_read_err)?,
            });
        }
        Ok(entries)
    }
}

impl MoodRepositoryPort for PostgresMoodStore {
    fn upsert(&self, record: MoodRecord) -> MoodRepositoryFuture<()> {
        let pool = self.pool.clone();
        Box::pin(async move { Self::upsert_inner(&pool, record).await })
    }

    fn list_range(
        &self,
        user_id: UserId,
        start: DateKey,
        end: DateKey,
    ) -> MoodRepositoryFuture<Vec<MoodHistoryEntry>> {
        let pool = self.pool.clone();
        Box::pin(async move { Self::list_range_inner(&pool, user_id, start, end).await })
    }
}

fn map_write_err(err: sqlx::Error) -> MoodRepositoryError {
    MoodRepositoryError::WriteFailed(err.to_string())
}

fn map_read_err(err: sqlx::Error) -> MoodRepositoryError {
    MoodRepositoryError::ReadFailed(err.to_string())
}
