use thiserror::Error;

use crate::shared::entities::DateKeyError;
use crate::shared::ports::audio_store::AudioStoreError;
use crate::shared::ports::emotion::EmotionError;
use crate::shared::ports::identity::IdentityError;
use crate::shared::ports::mood_repository::MoodRepositoryError;

/// Request-level failure taxonomy. Every endpoint failure is converted into
/// one of these before it crosses the transport boundary; nothing escapes
/// unconverted.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Authentication required".to_string())
    }

    pub fn invalid_token() -> Self {
        Self::Unauthenticated("Invalid token".to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken => Self::invalid_token(),
            IdentityError::Unavailable(reason) => {
                Self::Internal(format!("Token verification failed: {}", reason))
            }
        }
    }
}

impl From<DateKeyError> for ApiError {
    fn from(err: DateKeyError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<AudioStoreError> for ApiError {
    fn from(err: AudioStoreError) -> Self {
        match err {
            AudioStoreError::NotFound(_) => {
                Self::NotFound("Audio file not found in storage".to_string())
            }
            AudioStoreError::Io(reason) | AudioStoreError::Backend(reason) => {
                Self::Internal(reason)
            }
        }
    }
}

impl From<EmotionError> for ApiError {
    fn from(err: EmotionError) -> Self {
        Self::Internal(format!("Emotion analysis failed: {}", err))
    }
}

impl From<MoodRepositoryError> for ApiError {
    fn from(err: MoodRepositoryError) -> Self {
        Self::Internal(err.to_string())
    }
}
