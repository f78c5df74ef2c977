//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use tally_core::error::{Result, TallyError};

pub use schema::{ExportSection, ExporterConfig, RetentionSection, ServerSection};

/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "METRICS_HTTP_SERVER_PORT";

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TallyError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
pub fn load_or_default(path: &str) -> Result<ExporterConfig> {
    match fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path, "config file not found; using defaults");
            Ok(ExporterConfig::default())
        }
        _ => load_from_file(path),
    }
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| TallyError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `METRICS_HTTP_SERVER_PORT` if set.
pub fn apply_env_overrides(cfg: &mut ExporterConfig) -> Result<()> {
    let port = std::env::var(PORT_ENV).ok();
    apply_port_override(cfg, port.as_deref())
}

pub fn apply_port_override(cfg: &mut ExporterConfig, port: Option<&str>) -> Result<()> {
    let Some(raw) = port else { return Ok(()) };
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|e| TallyError::Config(format!("{PORT_ENV}={raw:?} is not a valid port: {e}")))?;
    cfg.server.port = port;
    cfg.validate()
}
