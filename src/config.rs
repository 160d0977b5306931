//! Configuration loading and management.

use crate::error::ImportError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Number of workflow columns every imported project receives.
pub const COLUMN_COUNT: usize = 4;

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = "kanboard-import.yaml";

/// Importer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to the JSON export (plain or gzipped).
    #[serde(default = "default_export_file")]
    pub export_file: PathBuf,

    /// Path to the Kanboard SQLite database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            export_file: default_export_file(),
            db_path: default_db_path(),
        }
    }
}

fn default_export_file() -> PathBuf {
    PathBuf::from("wunderlist.json")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("db.sqlite")
}

/// One entry of the column template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTemplate {
    pub title: String,
    pub position: i64,
    #[serde(default)]
    pub task_limit: i64,
}

impl ColumnTemplate {
    pub fn new(title: impl Into<String>, position: i64) -> Self {
        Self {
            title: title.into(),
            position,
            task_limit: 0,
        }
    }
}

/// How export records map onto projects, columns and tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Title of the synthetic inbox project.
    #[serde(default = "default_inbox_title")]
    pub inbox_title: String,

    /// Columns created for every project, in order.
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnTemplate>,

    /// Index into `columns` for open tasks.
    #[serde(default = "default_column_index")]
    pub default_column: usize,

    /// Index into `columns` for completed tasks.
    #[serde(default = "default_completed_column")]
    pub completed_column: usize,

    /// Kanboard user owning every imported task (0 = nobody).
    #[serde(default)]
    pub owner_id: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            inbox_title: default_inbox_title(),
            columns: default_columns(),
            default_column: default_column_index(),
            completed_column: default_completed_column(),
            owner_id: 0,
        }
    }
}

fn default_inbox_title() -> String {
    "Inbox".to_string()
}

fn default_columns() -> Vec<ColumnTemplate> {
    vec![
        ColumnTemplate::new("Pending", 1),
        ColumnTemplate::new("Ready", 2),
        ColumnTemplate::new("In progress", 3),
        ColumnTemplate::new("Done", 4),
    ]
}

fn default_column_index() -> usize {
    0
}

fn default_completed_column() -> usize {
    3
}

impl ImportConfig {
    /// Check the column template before any work is done.
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.columns.len() != COLUMN_COUNT {
            return Err(ImportError::Config(format!(
                "expected {} columns, found {}",
                COLUMN_COUNT,
                self.columns.len()
            )));
        }
        for (name, index) in [
            ("default_column", self.default_column),
            ("completed_column", self.completed_column),
        ] {
            if index >= self.columns.len() {
                return Err(ImportError::Config(format!(
                    "{} index {} is out of range (0..{})",
                    name,
                    index,
                    self.columns.len()
                )));
            }
        }
        // columns are UNIQUE (title, project_id) in the store
        let mut titles = HashSet::new();
        for column in &self.columns {
            if !titles.insert(column.title.as_str()) {
                return Err(ImportError::Config(format!(
                    "duplicate column title {:?}",
                    column.title
                )));
            }
        }
        if self.inbox_title.trim().is_empty() {
            return Err(ImportError::Config("inbox_title must not be empty".into()));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration from the usual places, then apply environment
    /// overrides.
    ///
    /// An explicit path (argument or `KANBOARD_IMPORT_CONFIG_PATH`) must
    /// exist. Otherwise `./kanboard-import.yaml` and the user config dir are
    /// tried in turn, falling back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("KANBOARD_IMPORT_CONFIG_PATH").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::candidate_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(Self::load)
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env();
        Ok(config)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("kanboard-import").join("config.yaml"));
        }
        paths
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("KANBOARD_IMPORT_EXPORT_FILE") {
            self.paths.export_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("KANBOARD_IMPORT_DB_PATH") {
            self.paths.db_path = PathBuf::from(path);
        }
        if let Ok(title) = std::env::var("KANBOARD_IMPORT_INBOX_TITLE") {
            self.import.inbox_title = title;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.import.validate().is_ok());
        assert_eq!(config.import.columns.len(), COLUMN_COUNT);
        assert_eq!(config.import.columns[3].title, "Done");
        assert_eq!(config.paths.db_path, PathBuf::from("db.sqlite"));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let mut config = ImportConfig::default();
        config.columns.pop();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("expected 4 columns"));
    }

    #[test]
    fn rejects_duplicate_column_titles() {
        let mut config = ImportConfig::default();
        config.columns[2].title = "Ready".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
        assert!(err.to_string().contains("duplicate column title \"Ready\""));
    }

    #[test]
    fn rejects_out_of_range_completed_column() {
        let config = ImportConfig {
            completed_column: 4,
            ..ImportConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("completed_column"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "import:\n  inbox_title: Boîte de réception\n  completed_column: 2\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.import.inbox_title, "Boîte de réception");
        assert_eq!(config.import.completed_column, 2);
        assert_eq!(config.import.default_column, 0);
        assert_eq!(config.import.columns.len(), 4);
        assert_eq!(config.paths.export_file, PathBuf::from("wunderlist.json"));
    }

    #[test]
    fn yaml_column_template() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
paths:
  db_path: /tmp/kanboard.sqlite
import:
  columns:
    - { title: En attente, position: 1 }
    - { title: Prêt, position: 2 }
    - { title: En cours, position: 3, task_limit: 5 }
    - { title: Terminé, position: 4 }
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.paths.db_path, PathBuf::from("/tmp/kanboard.sqlite"));
        assert_eq!(config.import.columns[2].task_limit, 5);
        assert_eq!(config.import.columns[0].task_limit, 0);
        assert!(config.import.validate().is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(temp.path().join("nope.yaml"));
        assert!(result.is_err());
    }
}
