//! CLI command handlers, one file per subcommand.

mod completions;
mod config;
mod files;
mod list;
mod manpage;
mod run;

pub use completions::run_completions;
pub use config::run_config;
pub use files::run_files;
pub use list::run_list;
pub use manpage::run_manpage;
pub use run::{run_etl, RunArgs};
#[cfg(test)]
pub(crate) use run::settle;

use anyhow::Result;
use dsetl_core::catalog::Catalog;
use dsetl_core::config::EtlConfig;
use std::path::Path;

/// `--catalog` flag, then `catalog` from config, then the builtin catalog.
fn load_catalog(cfg: &EtlConfig, flag: Option<&Path>) -> Result<Catalog> {
    let path = flag.or(cfg.catalog.as_deref());
    Ok(Catalog::load_or_builtin(path)?)
}
