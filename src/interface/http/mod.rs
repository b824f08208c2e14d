//! http モジュール: JSON API の薄いトランスポート層。
//! 認証・入力整形・エラー変換のみを担い、本体は service 層に委譲する。

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::service::{MoodAnalyzer, MoodQueryService, UploadUrlIssuer};
use crate::shared::entities::UserId;
use crate::shared::error::ApiError;
use crate::shared::ports::identity::IdentityPort;
use crate::shared::utils::mask_pii;

const SERVICE_NAME: &str = "voice-emotion-analysis";

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityPort>,
    pub issuer: Arc<UploadUrlIssuer>,
    pub analyzer: Arc<MoodAnalyzer>,
    pub query: Arc<MoodQueryService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/test", post(test_probe))
        .route("/get-upload-url", post(get_upload_url))
        .route("/analyze-emotion", post(analyze_emotion))
        .route("/get-mood-data", post(get_mood_data))
        .with_state(state)
}

/// Serves the API on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    log::info!("[http] mood API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::warn!("[http] shutdown signal error: {:?}", err);
            }
        })
        .await
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("[http] internal error: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Rejects with 401 before the request body is even read.
pub struct RequireUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(parts).ok_or_else(ApiError::unauthenticated)?;
        let user = state
            .identity
            .verify_token(token.to_string())
            .await
            .map_err(|err| {
                log::warn!(
                    "[http] token verification failed token={}: {}",
                    mask_pii(token),
                    err
                );
                ApiError::from(err)
            })?;
        Ok(Self(user))
    }
}

/// Like [`RequireUser`] but auth is attempted, not required. Used by the
/// connectivity probe.
pub struct MaybeUser(pub Option<UserId>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            Some(token) => state.identity.verify_token(token.to_string()).await.ok(),
            None => None,
        };
        Ok(Self(user))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TestResponse {
    message: &'static str,
    timestamp: String,
    user_authenticated: bool,
    user_id: Option<String>,
}

async fn test_probe(MaybeUser(user): MaybeUser) -> Json<TestResponse> {
    Json(TestResponse {
        message: "Mood API is working!",
        timestamp: Utc::now().to_rfc3339(),
        user_authenticated: user.is_some(),
        user_id: user.map(|u| u.as_str().to_string()),
    })
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UploadUrlRequest {
    date: Option<String>,
    content_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: String,
    storage_path: String,
}

async fn get_upload_url(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<UploadUrlRequest>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let issued = state
        .issuer
        .issue(&user, req.date.as_deref(), req.content_type.as_deref())
        .await?;
    Ok(Json(UploadUrlResponse {
        upload_url: issued.upload_url,
        storage_path: issued.storage_path,
    }))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    storage_path: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    score: f64,
    category: String,
    intensity: f64,
    timestamp: String,
}

async fn analyze_emotion(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let record = state
        .analyzer
        .analyze(&user, req.storage_path.as_deref())
        .await?;
    // 呼び出し側へは現在時刻を返す（保存値との厳密一致は要求されない）
    Ok(Json(AnalyzeResponse {
        score: record.score,
        category: record.category,
        intensity: record.intensity,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MoodDataRequest {
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoodEntryDto {
    date: String,
    score: f64,
    category: String,
    intensity: f64,
    recorded_at: Option<String>,
}

#[derive(Serialize)]
struct MoodDataResponse {
    moods: Vec<MoodEntryDto>,
    count: usize,
}

async fn get_mood_data(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<MoodDataRequest>,
) -> Result<Json<MoodDataResponse>, ApiError> {
    let history = state
        .query
        .query(&user, req.start_date.as_deref(), req.end_date.as_deref())
        .await?;
    let moods = history
        .records
        .into_iter()
        .map(|entry| MoodEntryDto {
            date: entry.date,
            score: entry.score,
            category: entry.category,
            intensity: entry.intensity,
            recorded_at: entry.recorded_at.map(|ts| ts.to_rfc3339()),
        })
        .collect();
    Ok(Json(MoodDataResponse {
        moods,
        count: history.count,
    }))
}
