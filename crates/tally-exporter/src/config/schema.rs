use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use tally_core::error::{Result, TallyError};

use crate::queue::SweepConfig;
use crate::server::default_server_name;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub retention: RetentionSection,

    #[serde(default)]
    pub export: ExportSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            retention: RetentionSection::default(),
            export: ExportSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.retention.validate()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.server.listen.parse().map_err(|e| {
            TallyError::Config(format!("server.listen must be an IP address: {e}"))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            interval: Duration::from_secs(self.retention.sweep_interval_secs),
            retention: Duration::from_secs(self.retention.window_secs),
        }
    }

    pub fn server_name(&self) -> String {
        self.server
            .server_name
            .clone()
            .unwrap_or_else(default_server_name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub server_name: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            server_name: None,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(TallyError::Config("server.port must be non-zero".into()));
        }
        if let Some(name) = &self.server_name {
            if name.trim().is_empty() || name.chars().any(|c| c.is_control()) {
                return Err(TallyError::Config(
                    "server.server_name must be non-empty printable text".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionSection {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RetentionSection {
    pub fn validate(&self) -> Result<()> {
        if self.window_secs < 60 {
            return Err(TallyError::Config(
                "retention.window_secs must be at least 60".into(),
            ));
        }
        if !(1..=self.window_secs).contains(&self.sweep_interval_secs) {
            return Err(TallyError::Config(
                "retention.sweep_interval_secs must be between 1 and window_secs".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSection {
    /// Render `tally_process_*` families on every scrape.
    #[serde(default = "default_true")]
    pub process_metrics: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            process_metrics: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_listen() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    9100
}
fn default_window_secs() -> u64 {
    60 * 60
}
fn default_sweep_interval_secs() -> u64 {
    10 * 60
}
