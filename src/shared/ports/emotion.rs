use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;

/// Raw engine output for one audio file: a label from the engine's closed
/// label set plus an unbounded signed intensity.
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionOutcome {
    pub category: String,
    pub intensity: f64,
}

#[derive(Debug, Error)]
pub enum EmotionError {
    #[error("engine initialization failed: {0}")]
    InitFailed(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

pub type EmotionFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The pretrained emotion pipeline, treated as a black box: given a local
/// audio file, return `(category, intensity)`. Deterministic for identical
/// input under a fixed loaded model version. Implementations carry their own
/// heavy load cost and must guard lazy initialization so concurrent first
/// requests do not load twice.
pub trait EmotionEnginePort: Send + Sync {
    fn infer(&self, audio_path: PathBuf) -> EmotionFuture<Result<EmotionOutcome, EmotionError>>;
}
