//! `dsetl files NAME` – enumerate one dataset without downloading it.

use anyhow::Result;
use dsetl_core::config::EtlConfig;
use dsetl_core::transport::{CurlTransport, Transport};
use std::path::Path;
use std::sync::Arc;

use super::load_catalog;

pub async fn run_files(cfg: &EtlConfig, name: &str, catalog: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(cfg, catalog)?.select(&[name.to_string()])?;
    let transport: Arc<dyn Transport> =
        Arc::new(CurlTransport::new(cfg.transport.curl_options()));
    let Some(job) = catalog.into_jobs(transport).into_iter().next() else {
        return Ok(());
    };

    let (job, files) = tokio::task::spawn_blocking(move || {
        let files = job.list_files();
        (job, files)
    })
    .await?;
    let files = files?;

    let mut skipped = 0usize;
    for f in &files {
        if f.is_empty() {
            skipped += 1;
            continue;
        }
        println!("{}", job.file_url(f));
    }
    println!(
        "{}: {} file(s), {} index entr{} skipped",
        job.name(),
        files.len() - skipped,
        skipped,
        if skipped == 1 { "y" } else { "ies" }
    );
    Ok(())
}
