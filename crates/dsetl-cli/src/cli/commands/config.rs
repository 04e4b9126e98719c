//! `dsetl config` – show where config and logs live and what is in effect.

use anyhow::Result;
use dsetl_core::config::{self, EtlConfig, FailurePolicy};
use dsetl_core::logging;

pub fn run_config(cfg: &EtlConfig) -> Result<()> {
    println!("config file:          {}", config::config_path()?.display());
    println!("log file:             {}", logging::log_path()?.display());
    println!(
        "output_root:          {}",
        cfg.output_root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(current directory)".to_string())
    );
    println!(
        "max_concurrent_jobs:  {}{}",
        cfg.max_concurrent_jobs,
        if cfg.max_concurrent_jobs == 0 { " (unbounded)" } else { "" }
    );
    let policy = match cfg.failure_policy {
        FailurePolicy::Isolate => "isolate",
        FailurePolicy::Abort => "abort",
    };
    println!("failure_policy:       {}", policy);
    println!(
        "catalog:              {}",
        cfg.catalog
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(builtin)".to_string())
    );
    println!(
        "connect_timeout_secs: {}",
        cfg.transport
            .connect_timeout_secs
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("write buffer bytes:   {}", cfg.transport.write_buffer_bytes());
    Ok(())
}
