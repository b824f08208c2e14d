//! engine モジュール: 感情推論サイドカーの HTTP クライアント。
//! モデル一式（特徴量抽出器＋分類器＋回帰器）はサイドカー側に住んでおり、
//! ここからは「ローカル音声ファイル → (category, intensity)」しか見えない。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{multipart, Client};
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::shared::ports::emotion::{
    EmotionEnginePort, EmotionError, EmotionFuture, EmotionOutcome,
};

#[derive(Deserialize)]
struct InferResponse {
    category: Option<String>,
    // 旧サイドカーは "emotion" キーで返す
    emotion: Option<String>,
    intensity: Option<f64>,
}

struct EngineInner {
    base_url: String,
    timeout: Duration,
    client: OnceCell<Client>,
}

impl EngineInner {
    /// First use per process pays the sidecar's model-load cost via the
    /// warmup probe; afterwards the initialized client is reused. The cell
    /// guards concurrent first requests, and stays empty after a failed init
    /// so a fresh request retries it.
    async fn engine_client(&self) -> Result<&Client, EmotionError> {
        self.client
            .get_or_try_init(|| async {
                log::info!("[engine] initializing inference client ({})", self.base_url);
                let client = Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| EmotionError::InitFailed(e.to_string()))?;
                let resp = client
                    .get(format!("{}/health", self.base_url))
                    .send()
                    .await
                    .map_err(|e| EmotionError::InitFailed(e.to_string()))?;
                if !resp.status().is_success() {
                    return Err(EmotionError::InitFailed(format!(
                        "engine health status {}",
                        resp.status().as_u16()
                    )));
                }
                log::info!("[engine] inference engine ready");
                Ok(client)
            })
            .await
    }

    async fn infer_file(&self, audio_path: PathBuf) -> Result<EmotionOutcome, EmotionError> {
        let client = self.engine_client().await?;

        let bytes = tokio::fs::read(&audio_path)
            .await
            .map_err(|e| EmotionError::InferenceFailed(format!("audio read: {}", e)))?;
        let file_name = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio.m4a")
            .to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| EmotionError::InferenceFailed(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let resp = client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| EmotionError::InferenceFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmotionError::InferenceFailed(format!(
                "engine status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let response: InferResponse = resp
            .json()
            .await
            .map_err(|e| EmotionError::InferenceFailed(format!("response parse: {}", e)))?;
        outcome_from_response(response)
    }
}

fn outcome_from_response(response: InferResponse) -> Result<EmotionOutcome, EmotionError> {
    let category = response
        .category
        .or(response.emotion)
        .filter(|label| !label.trim().is_empty())
        .ok_or_else(|| {
            EmotionError::InferenceFailed("engine response missing category".to_string())
        })?;
    let intensity = response.intensity.ok_or_else(|| {
        EmotionError::InferenceFailed("engine response missing intensity".to_string())
    })?;
    Ok(EmotionOutcome {
        category,
        intensity,
    })
}

/// Process-wide HTTP adapter for the inference sidecar, constructed once at
/// startup and injected wherever inference is needed.
pub struct HttpEmotionEngine {
    inner: Arc<EngineInner>,
}

impl HttpEmotionEngine {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                base_url,
                timeout,
                client: OnceCell::new(),
            }),
        }
    }
}

impl EmotionEnginePort for HttpEmotionEngine {
    fn infer(&self, audio_path: PathBuf) -> EmotionFuture<Result<EmotionOutcome, EmotionError>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.infer_file(audio_path).await })
    }
}
