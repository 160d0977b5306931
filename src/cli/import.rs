//! Import subcommand for kanboard-import
//!
//! Moves the lists, tasks and sub-tasks of an export file into the
//! Kanboard database in one transaction.

use crate::config::Config;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Path to the export file (overrides config)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Run the whole import, then roll it back
    ///
    /// Reports what would be created without keeping any change.
    #[arg(long)]
    pub dry_run: bool,

    /// Title of the synthetic inbox project (overrides config)
    #[arg(long)]
    pub inbox_title: Option<String>,
}

impl ImportArgs {
    /// Apply command-line overrides to the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(file) = &self.file {
            config.paths.export_file = file.clone();
        }
        if let Some(title) = &self.inbox_title {
            config.import.inbox_title = title.clone();
        }
    }

    /// Describe the import mode for logging
    pub fn import_mode(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "commit" }
    }
}
