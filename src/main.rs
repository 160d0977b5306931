//! kanboard-import
//!
//! One-shot importer moving a Wunderlist-style JSON export into a Kanboard
//! SQLite database.

use anyhow::Result;
use clap::Parser;
use kanboard_import::cli::import::ImportArgs;
use kanboard_import::cli::{Cli, Command};
use kanboard_import::config::Config;
use kanboard_import::db::Database;
use kanboard_import::import::Importer;
use kanboard_import::logging::{self, LogTarget};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::discover(cli.config.as_deref())?;

    // Override paths from CLI arguments
    if let Some(db_path) = &cli.database {
        config.paths.db_path = db_path.clone();
    }

    match cli.command {
        Some(Command::InitDb) => run_init_db(&config)?,
        Some(Command::Import(args)) => run_import(config, args)?,
        None => run_import(config, ImportArgs::default())?,
    }

    Ok(())
}

/// Run the init-db command
fn run_init_db(config: &Config) -> Result<()> {
    Database::create(&config.paths.db_path)?;
    println!("Schema ready in {}", config.paths.db_path.display());
    Ok(())
}

/// Run the import command
fn run_import(mut config: Config, args: ImportArgs) -> Result<()> {
    args.apply(&mut config);
    info!(mode = args.import_mode(), "Importing");

    let result = Importer::new(&config.import)
        .dry_run(args.dry_run)
        .run(&config.paths.export_file, &config.paths.db_path);

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            if err.rolled_back() {
                eprintln!("! Rolled back, {} is unchanged", config.paths.db_path.display());
            }
            return Err(err.into());
        }
    };

    if summary.dry_run {
        println!("Dry run results (rolled back):");
    } else {
        println!("Import complete:");
    }
    println!("  Projects: {}", summary.projects);
    println!("  Columns: {}", summary.columns);
    println!("  Tasks: {}", summary.tasks);
    println!("  Sub-tasks appended: {}", summary.subtasks_appended);
    if summary.subtasks_skipped > 0 {
        println!("  Sub-tasks skipped (unknown parent): {}", summary.subtasks_skipped);
    }

    Ok(())
}
