use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tempfile::tempdir;
use tokio::net::TcpListener;

use voice_diary_backend::interface::http::{self, AppState};
use voice_diary_backend::service::{MoodAnalyzer, MoodQueryService, UploadUrlIssuer};
use voice_diary_backend::shared::entities::{DateKey, MoodHistoryEntry, MoodRecord, UserId};
use voice_diary_backend::shared::logging;
use voice_diary_backend::shared::ports::audio_store::{
    AudioStoreError, AudioStoreFuture, AudioStorePort,
};
use voice_diary_backend::shared::ports::emotion::{
    EmotionEnginePort, EmotionError, EmotionFuture, EmotionOutcome,
};
use voice_diary_backend::shared::ports::identity::{
    IdentityError, IdentityFuture, IdentityPort,
};
use voice_diary_backend::shared::ports::mood_repository::{
    MoodRepositoryFuture, MoodRepositoryPort,
};

const GOOD_TOKEN: &str = "good-token";
const TEST_USER: &str = "user-1";

struct ServerGuard(tokio::task::JoinHandle<()>);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct FakeIdentity;

impl IdentityPort for FakeIdentity {
    fn verify_token(&self, token: String) -> IdentityFuture<Result<UserId, IdentityError>> {
        Box::pin(async move {
            if token == GOOD_TOKEN {
                Ok(UserId::new(TEST_USER).unwrap())
            } else {
                Err(IdentityError::InvalidToken)
            }
        })
    }
}

#[derive(Default)]
struct FakeAudioStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    presign_calls: AtomicUsize,
}

impl AudioStorePort for FakeAudioStore {
    fn exists(&self, path: String) -> AudioStoreFuture<bool> {
        let found = self.blobs.lock().unwrap().contains_key(&path);
        Box::pin(async move { Ok(found) })
    }

    fn download_to(&self, path: String, local: PathBuf) -> AudioStoreFuture<()> {
        let bytes = self.blobs.lock().unwrap().get(&path).cloned();
        Box::pin(async move {
            let bytes = bytes.ok_or(AudioStoreError::NotFound(path))?;
            tokio::fs::write(&local, bytes)
                .await
                .map_err(|e| AudioStoreError::Io(e.to_string()))
        })
    }

    fn presign_put(
        &self,
        path: String,
        content_type: String,
        expiry: Duration,
    ) -> AudioStoreFuture<String> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            Ok(format!(
                "https://uploads.test/{}?ct={}&expires={}",
                path,
                content_type,
                expiry.as_secs()
            ))
        })
    }
}

/// Reads the downloaded temp file and parses the intensity out of its bytes,
/// so the blob -> temp file -> engine flow is exercised for real.
struct FakeEngine;

impl EmotionEnginePort for FakeEngine {
    fn infer(&self, audio_path: PathBuf) -> EmotionFuture<Result<EmotionOutcome, EmotionError>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&audio_path)
                .await
                .map_err(|e| EmotionError::InferenceFailed(e.to_string()))?;
            let intensity = String::from_utf8_lossy(&bytes)
                .trim()
                .parse::<f64>()
                .unwrap_or(0.37);
            Ok(EmotionOutcome {
                category: "calm".to_string(),
                intensity,
            })
        })
    }
}

#[derive(Default)]
struct FakeRepository {
    records: Mutex<HashMap<(String, String), MoodRecord>>,
}

impl MoodRepositoryPort for FakeRepository {
    fn upsert(&self, record: MoodRecord) -> MoodRepositoryFuture<()> {
        let key = (
            record.user_id.as_str().to_string(),
            record.date_key.as_str().to_string(),
        );
        self.records.lock().unwrap().insert(key, record);
        Box::pin(async move { Ok(()) })
    }

    fn list_range(
        &self,
        user_id: UserId,
        start: DateKey,
        end: DateKey,
    ) -> MoodRepositoryFuture<Vec<MoodHistoryEntry>> {
        let entries: Vec<MoodHistoryEntry> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id && r.date_key >= start && r.date_key <= end)
            .map(|r| MoodHistoryEntry {
                date: r.date_key.as_str().to_string(),
                score: r.score,
                category: r.category.clone(),
                intensity: r.intensity,
                recorded_at: Some(r.recorded_at),
            })
            .collect();
        Box::pin(async move { Ok(entries) })
    }
}

fn seed_record(repo: &FakeRepository, date: &str, score: f64) {
    let record = MoodRecord::from_inference(
        UserId::new(TEST_USER).unwrap(),
        DateKey::new(date).unwrap(),
        format!("audio/{}/{}.m4a", TEST_USER, date),
        "neutral".to_string(),
        score,
    );
    let key = (
        record.user_id.as_str().to_string(),
        record.date_key.as_str().to_string(),
    );
    repo.records.lock().unwrap().insert(key, record);
}

#[tokio::test]
async fn mood_api_e2e() -> Result<(), Box<dyn std::error::Error>> {
    env::set_var("LOG_MODE", "stdout");
    env::set_var("RUST_LOG", "info");
    logging::init();

    let temp = tempdir()?;
    let store = Arc::new(FakeAudioStore::default());
    let repo = Arc::new(FakeRepository::default());
    let state = AppState {
        identity: Arc::new(FakeIdentity),
        issuer: Arc::new(UploadUrlIssuer::new(
            store.clone(),
            Duration::from_secs(900),
        )),
        analyzer: Arc::new(MoodAnalyzer::new(
            store.clone(),
            Arc::new(FakeEngine),
            repo.clone(),
            temp.path().to_path_buf(),
        )),
        query: Arc::new(MoodQueryService::new(repo.clone())),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, http::router(state)).await;
    });
    let _guard = ServerGuard(handle);

    let base_url = format!("http://{}", addr);
    let client = reqwest::Client::new();

    // ヘルスチェックは認証不要
    let res = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "voice-emotion-analysis");

    // 認証なしはどの操作も 401、副作用なし
    for path in ["/get-upload-url", "/analyze-emotion", "/get-mood-data"] {
        let res = client
            .post(format!("{}{}", base_url, path))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {}", path);
        let body: serde_json::Value = res.json().await?;
        assert_eq!(body["error"], "Authentication required");
    }
    let res = client
        .post(format!("{}/get-upload-url", base_url))
        .bearer_auth("wrong-token")
        .json(&serde_json::json!({"date": "2024-03-05"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Invalid token");
    assert_eq!(store.presign_calls.load(Ordering::SeqCst), 0);
    assert!(repo.records.lock().unwrap().is_empty());

    // 署名付きURL発行
    let res = client
        .post(format!("{}/get-upload-url", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"date": "2024-03-05"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["storagePath"], "audio/user-1/2024-03-05.m4a");
    let upload_url = body["uploadUrl"].as_str().unwrap();
    assert!(upload_url.contains("audio/user-1/2024-03-05.m4a"));
    assert!(upload_url.contains("expires=900"));

    let res = client
        .post(format!("{}/get-upload-url", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"date": "not-a-date"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // 解析: クライアントのアップロードを模してブロブを直接置く
    store.blobs.lock().unwrap().insert(
        "audio/user-1/2024-03-05.m4a".to_string(),
        b"3.2".to_vec(),
    );
    let res = client
        .post(format!("{}/analyze-emotion", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"storagePath": "audio/user-1/2024-03-05.m4a"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["category"], "calm");
    assert_eq!(body["intensity"], 3.2);
    assert_eq!(body["score"], 1.0);
    assert!(body["timestamp"].as_str().is_some());

    // 再解析しても同じ日付のレコードが1件のまま（上書き）
    let res = client
        .post(format!("{}/analyze-emotion", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"storagePath": "audio/user-1/2024-03-05.m4a"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(repo.records.lock().unwrap().len(), 1);

    // 不在ブロブは 404、レコードは増えない
    let res = client
        .post(format!("{}/analyze-emotion", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"storagePath": "audio/user-1/2024-03-06.m4a"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Audio file not found in storage");
    assert_eq!(repo.records.lock().unwrap().len(), 1);

    // どの経路でも一時ファイルは残らない
    assert_eq!(std::fs::read_dir(temp.path())?.count(), 0);

    // 範囲クエリ（両端含む・辞書順比較）
    seed_record(&repo, "2023-12-31", 0.1);
    seed_record(&repo, "2024-01-01", 0.2);
    seed_record(&repo, "2024-01-05", 0.3);
    seed_record(&repo, "2024-01-07", 0.4);
    seed_record(&repo, "2024-01-08", 0.5);
    let res = client
        .post(format!("{}/get-mood-data", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"startDate": "2024-01-01", "endDate": "2024-01-07"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["count"], 3);
    let mut dates: Vec<&str> = body["moods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["date"].as_str().unwrap())
        .collect();
    dates.sort_unstable();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-05", "2024-01-07"]);
    for mood in body["moods"].as_array().unwrap() {
        assert!(mood["recordedAt"].as_str().is_some());
        assert!(mood["score"].as_f64().is_some());
    }

    // start > end は空で返る（エラーではない）
    let res = client
        .post(format!("{}/get-mood-data", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"startDate": "2024-02-01", "endDate": "2024-01-01"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["count"], 0);

    let res = client
        .post(format!("{}/get-mood-data", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({"startDate": "2024-01-01"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Start date and end date are required");

    // 接続確認プローブは認証任意
    let res = client
        .post(format!("{}/test", base_url))
        .json(&serde_json::json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["userAuthenticated"], false);
    assert!(body["userId"].is_null());

    let res = client
        .post(format!("{}/test", base_url))
        .bearer_auth(GOOD_TOKEN)
        .json(&serde_json::json!({}))
        .send()
        .await?;
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["userAuthenticated"], true);
    assert_eq!(body["userId"], TEST_USER);

    Ok(())
}
