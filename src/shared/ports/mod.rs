pub mod audio_store;
pub mod emotion;
pub mod identity;
pub mod mood_repository;

pub use audio_store::{AudioStoreError, AudioStorePort};
pub use emotion::{EmotionEnginePort, EmotionError, EmotionOutcome};
pub use identity::{IdentityError, IdentityPort};
pub use mood_repository::{MoodRepositoryError, MoodRepositoryPort};
