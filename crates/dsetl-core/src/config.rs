use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::DEFAULT_BUFFER_BYTES;
use crate::transport::CurlOptions;

/// What a dataset failure does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure in the run report; other datasets keep going.
    #[default]
    Isolate,
    /// First failure stops every in-flight and queued dataset; the run fails.
    Abort,
}

/// Transport parameters (optional `[transport]` section in config.toml).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Connect timeout in seconds (None = libcurl default). There is no
    /// overall transfer timeout.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Receive buffer and file write buffer size in bytes (None = 64 KiB writer,
    /// libcurl default receive buffer).
    #[serde(default)]
    pub buffer_size: Option<usize>,
}

impl TransportConfig {
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            buffer_size: self.buffer_size,
        }
    }

    pub fn write_buffer_bytes(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_BYTES)
    }
}

/// Global configuration loaded from `~/.config/dsetl/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Directory that receives one sub-directory per dataset (None = current directory).
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    /// Maximum datasets downloading at once; 0 = one thread per dataset, no cap.
    pub max_concurrent_jobs: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Catalog file (None = builtin catalog).
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            output_root: None,
            max_concurrent_jobs: 8,
            failure_policy: FailurePolicy::Isolate,
            catalog: None,
            transport: TransportConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsetl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EtlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EtlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: EtlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
