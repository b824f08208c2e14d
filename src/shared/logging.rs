use std::io::Write;
use std::path::Path;
use std::sync::Once;

use chrono::Utc;

use crate::shared::config::{self, LogFormat, LogMode, LoggingConfig};

static INIT: Once = Once::new();

/// Installs the global logger on first call according to
/// `config::logging_config()`: JSON or plain-text lines, to stdout or to a
/// log file. Problems opening the file target are downgraded to warnings and
/// logging falls back to stdout. Safe to call repeatedly.
pub fn init() {
    INIT.call_once(|| {
        let cfg = config::logging_config().clone();
        let mut warnings = Vec::new();

        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        let format = cfg.format.clone();
        builder.format(move |buf, record| {
            let ts = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
            match format {
                LogFormat::Json => writeln!(
                    buf,
                    "{}",
                    serde_json::json!({
                        "ts": ts,
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "msg": record.args().to_string(),
                    })
                ),
                LogFormat::Text => writeln!(
                    buf,
                    "{} {} {} {}",
                    ts,
                    record.level(),
                    record.target(),
                    record.args()
                ),
            }
        });
        builder.target(output_target(&cfg, &mut warnings));

        let _ = builder.try_init();
        for warning in warnings {
            log::warn!("{}", warning);
        }
    });
}

fn output_target(cfg: &LoggingConfig, warnings: &mut Vec<String>) -> env_logger::Target {
    let dir = match (&cfg.mode, cfg.dir.as_ref()) {
        (LogMode::File, Some(dir)) => dir,
        _ => return env_logger::Target::Stdout,
    };

    if let Err(err) = std::fs::create_dir_all(dir) {
        warnings.push(format!("[logging] failed to create log dir: {}", err));
    }
    let path = Path::new(dir).join(&cfg.file_name);
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => env_logger::Target::Pipe(Box::new(file)),
        Err(err) => {
            warnings.push(format!(
                "[logging] failed to open log file ({}): {}",
                path.display(),
                err
            ));
            env_logger::Target::Stdout
        }
    }
}
