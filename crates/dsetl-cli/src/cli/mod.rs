//! CLI for the dsetl dataset downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dsetl_core::config;
use std::path::PathBuf;

use commands::{
    run_completions, run_config, run_etl, run_files, run_list, run_manpage, RunArgs,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dsetl", version)]
#[command(about = "dsetl: download bulk datasets concurrently, one directory per dataset", long_about = None)]
pub struct Cli {
    /// Log to stderr instead of the state-directory log file.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every dataset in the catalog (or the ones named with --only).
    Run {
        /// Catalog file (default: `catalog` from config, else the builtin catalog).
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
        /// Directory that receives one sub-directory per dataset (default: config, else current directory).
        #[arg(long, short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,
        /// Datasets downloading at once; 0 = all at once (default: config, 8).
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,
        /// Stop the whole run at the first dataset failure.
        #[arg(long)]
        fail_fast: bool,
        /// Only run this dataset (repeatable).
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
        /// Write a JSON run report to PATH.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// List catalog datasets.
    List {
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
    },

    /// Show the files a dataset would download.
    Files {
        /// Dataset name.
        name: String,
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
    },

    /// Print the config file location and effective settings.
    Config,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Manpage,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Manpage => run_manpage()?,
            command => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                match command {
                    CliCommand::Run {
                        catalog,
                        output,
                        jobs,
                        fail_fast,
                        only,
                        report,
                    } => {
                        let args = RunArgs {
                            catalog,
                            output,
                            jobs,
                            fail_fast,
                            only,
                            report,
                        };
                        run_etl(&cfg, args).await?;
                    }
                    CliCommand::List { catalog } => run_list(&cfg, catalog.as_deref())?,
                    CliCommand::Files { name, catalog } => {
                        run_files(&cfg, &name, catalog.as_deref()).await?
                    }
                    CliCommand::Config => run_config(&cfg)?,
                    CliCommand::Completions { .. } | CliCommand::Manpage => {}
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
