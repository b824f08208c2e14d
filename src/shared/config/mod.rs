use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub http_bind_addr: String,
}

impl Config {
    /// Create a Config populated from environment variables, falling back to
    /// sensible defaults when keys are absent.
    ///
    /// Reads (and defaults) the following environment variables:
    /// - HTTP_BIND_ADDR (default "0.0.0.0:8080")
    ///
    /// # Examples
    ///
    /// ```
    /// use voice_diary_backend::config::Config;
    ///
    /// let cfg = Config::from_env().unwrap();
    /// let _addr = cfg.http_bind_addr;
    /// ```
    pub fn from_env() -> Result<Self> {
        let http_bind_addr =
            std::env::var("HTTP_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        Ok(Self { http_bind_addr })
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub upload_url_ttl: Duration,
    pub temp_dir: PathBuf,
}

impl StorageConfig {
    /// Required env: AUDIO_BUCKET. Optional: UPLOAD_URL_TTL_SEC (default 900,
    /// the 15 minute signed-URL window), AUDIO_TEMP_DIR (default: OS temp dir).
    pub fn from_env() -> Result<Self> {
        let bucket = env_non_empty("AUDIO_BUCKET")
            .ok_or_else(|| anyhow!("AUDIO_BUCKET must be set"))?;
        let upload_url_ttl = env_duration_sec("UPLOAD_URL_TTL_SEC", 900);
        let temp_dir = env_non_empty("AUDIO_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Ok(Self {
            bucket,
            upload_url_ttl,
            temp_dir,
        })
    }
}

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub verify_url: String,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self> {
        let verify_url = env_non_empty("IDENTITY_VERIFY_URL")
            .ok_or_else(|| anyhow!("IDENTITY_VERIFY_URL must be set"))?;
        Ok(Self { verify_url })
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub base_url: String,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = env_non_empty("EMOTION_ENGINE_URL")
            .ok_or_else(|| anyhow!("EMOTION_ENGINE_URL must be set"))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Returns the configured PostgreSQL DSN for the mood record store, if any.
pub fn database_url() -> Option<String> {
    env_non_empty("DATABASE_URL")
}

#[derive(Clone, Debug)]
pub struct Timeouts {
    pub identity_http: Duration,
    pub engine_http: Duration,
    pub storage_io: Duration,
}

impl Timeouts {
    fn from_env() -> Self {
        // Defaults: identity 5s, engine 60s (model inference is the slow
        // path), storage I/O 30s.
        // Env: IDENTITY_HTTP_TIMEOUT_MS / ENGINE_HTTP_TIMEOUT_MS /
        // STORAGE_IO_TIMEOUT_MS. Timeout behavior: HTTP clients return an
        // error, surfaced to the caller as an internal failure.
        Self {
            identity_http: env_duration_ms("IDENTITY_HTTP_TIMEOUT_MS", 5_000),
            engine_http: env_duration_ms("ENGINE_HTTP_TIMEOUT_MS", 60_000),
            storage_io: env_duration_ms("STORAGE_IO_TIMEOUT_MS", 30_000),
        }
    }
}

static TIMEOUTS: OnceLock<Timeouts> = OnceLock::new();

pub fn timeouts() -> &'static Timeouts {
    TIMEOUTS.get_or_init(Timeouts::from_env)
}

#[derive(Clone, Debug)]
pub enum LogMode {
    Stdout,
    File,
}

#[derive(Clone, Debug)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub mode: LogMode,
    pub format: LogFormat,
    pub dir: Option<String>,
    pub file_name: String,
}

impl LoggingConfig {
    fn from_env() -> Self {
        let dir_env = std::env::var("LOG_DIR").ok();
        let mode_env = std::env::var("LOG_MODE").ok();
        let format_env = std::env::var("LOG_FORMAT").ok();

        let format = match format_env.as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let mode = match mode_env.as_deref() {
            Some("file") => LogMode::File,
            Some("stdout") => LogMode::Stdout,
            _ => {
                if dir_env.is_some() {
                    LogMode::File
                } else {
                    LogMode::Stdout
                }
            }
        };

        let dir = match mode {
            LogMode::File => Some(dir_env.unwrap_or_else(|| "logs".to_string())),
            LogMode::Stdout => None,
        };

        let file_name = std::env::var("LOG_FILE_NAME").unwrap_or_else(|_| "app.log".to_string());

        Self {
            mode,
            format,
            dir,
            file_name,
        }
    }
}

static LOGGING: OnceLock<LoggingConfig> = OnceLock::new();

pub fn logging_config() -> &'static LoggingConfig {
    LOGGING.get_or_init(LoggingConfig::from_env)
}

fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

fn env_duration_sec(key: &str, default_sec: u64) -> Duration {
    let sec = std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_sec);
    Duration::from_secs(sec)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
