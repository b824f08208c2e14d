pub mod identifiers;
pub mod mood;

pub use identifiers::{DateKey, DateKeyError, UserId, UserIdError};
pub use mood::{MoodHistoryEntry, MoodRecord, MOOD_SOURCE, PIPELINE_VERSION};
