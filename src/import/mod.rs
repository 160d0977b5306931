//! Export to Kanboard import driver.
//!
//! A run loads the export, then executes three passes inside a single
//! transaction:
//! 1. lists -> projects + template columns
//! 2. top-level tasks -> task rows
//! 3. sub-tasks -> checklist lines on their parent
//!
//! The transaction commits only when every pass succeeds. Any pass failure
//! rolls back everything staged so far. Running twice duplicates every row:
//! there is no dedup key.

pub mod passes;
pub mod remap;
pub mod transform;

use crate::config::ImportConfig;
use crate::db::{Database, now_secs};
use crate::error::{ImportError, ImportResult, Pass, TransformError};
use crate::export::ExportDocument;
use passes::PassContext;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};

/// Counts reported by a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub projects: usize,
    pub columns: usize,
    pub tasks: usize,
    /// Sub-tasks appended to a parent description.
    pub subtasks_appended: usize,
    /// Sub-tasks whose parent was not imported.
    pub subtasks_skipped: usize,
    /// True when the run was rolled back on purpose.
    pub dry_run: bool,
}

/// Runs imports for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Importer<'a> {
    config: &'a ImportConfig,
    dry_run: bool,
}

impl<'a> Importer<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Run every pass, then roll back instead of committing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Import the export file at `export_path` into the database at
    /// `database_path`.
    ///
    /// The export is read and parsed before the database is touched, so
    /// `Io` and `Parse` failures never open a transaction.
    pub fn run(&self, export_path: &Path, database_path: &Path) -> ImportResult<ImportSummary> {
        self.config.validate()?;

        info!("Opening file {}", export_path.display());
        let document = ExportDocument::from_file(export_path)?;

        info!("Opening database {}", database_path.display());
        let mut db = Database::open(database_path)?;

        self.import(&mut db, &document)
    }

    /// Import an already loaded document.
    pub fn import(&self, db: &mut Database, document: &ExportDocument) -> ImportResult<ImportSummary> {
        self.config.validate()?;

        let missing = db.missing_tables()?;
        if !missing.is_empty() {
            return Err(ImportError::Schema { missing });
        }

        let lists = document.lists_with_inbox(&self.config.inbox_title);
        let ctx = PassContext {
            config: self.config,
            now: now_secs(),
        };

        db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            info!("Started importing");

            match run_passes(&tx, &lists, document, &ctx) {
                Ok(mut summary) => {
                    if self.dry_run {
                        tx.rollback()?;
                        summary.dry_run = true;
                        info!("Dry run finished, nothing saved");
                    } else {
                        info!("Saving database...");
                        tx.commit()?;
                        info!("Finished importing");
                    }
                    Ok(summary)
                }
                Err(err) => {
                    error!("! Import failed, rolling back: {}", err);
                    if let Err(rollback_err) = tx.rollback() {
                        warn!("rollback reported an error: {}", rollback_err);
                    }
                    Err(err)
                }
            }
        })
    }
}

/// Import `export_path` into `database_path` with the given configuration.
pub fn run(
    export_path: &Path,
    database_path: &Path,
    config: &ImportConfig,
) -> ImportResult<ImportSummary> {
    Importer::new(config).run(export_path, database_path)
}

fn run_passes(
    conn: &Connection,
    lists: &[Value],
    document: &ExportDocument,
    ctx: &PassContext<'_>,
) -> ImportResult<ImportSummary> {
    let mut summary = ImportSummary::default();

    info!("> Projects");
    let list_remap = passes::import_projects(conn, lists, ctx, &mut summary)
        .map_err(in_pass(Pass::Projects))?;

    info!("> Main tasks");
    let task_remap = passes::import_tasks(conn, document.tasks(), &list_remap, ctx, &mut summary)
        .map_err(in_pass(Pass::Tasks))?;

    info!("> Sub tasks");
    passes::import_subtasks(conn, document.subtasks(), &task_remap, &mut summary)
        .map_err(in_pass(Pass::Subtasks))?;

    Ok(summary)
}

fn in_pass(pass: Pass) -> impl Fn(TransformError) -> ImportError {
    move |source| ImportError::Transform { pass, source }
}
