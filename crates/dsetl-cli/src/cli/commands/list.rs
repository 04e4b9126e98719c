//! `dsetl list` – show catalog datasets.

use anyhow::Result;
use dsetl_core::config::EtlConfig;
use std::path::Path;

use super::load_catalog;

pub fn run_list(cfg: &EtlConfig, catalog: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(cfg, catalog)?;
    if catalog.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }
    println!("{:<44} {:<10} {}", "NAME", "LISTING", "BASE URL");
    for d in catalog.entries() {
        println!("{:<44} {:<10} {}", d.name, d.listing_label(), d.base_url);
        if let Some(desc) = &d.description {
            println!("    {}", desc);
        }
    }
    println!("{} dataset(s)", catalog.len());
    Ok(())
}
