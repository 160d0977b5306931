//! Error types for the import pipeline.
//!
//! `ImportError` is what a run reports. Failures raised inside the
//! transactional passes are `TransformError`s, tagged with the [`Pass`] that
//! produced them before they reach the caller.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The transactional stage of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Lists to projects and their columns.
    Projects,
    /// Top-level tasks to task rows.
    Tasks,
    /// Sub-tasks folded into their parent's description.
    Subtasks,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Projects => write!(f, "projects"),
            Pass::Tasks => write!(f, "tasks"),
            Pass::Subtasks => write!(f, "sub-tasks"),
        }
    }
}

/// Kind of export record a transform failure points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    List,
    Task,
    Subtask,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::List => write!(f, "list"),
            RecordKind::Task => write!(f, "task"),
            RecordKind::Subtask => write!(f, "sub-task"),
        }
    }
}

/// Failure inside a transactional pass. Any of these rolls the run back.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{kind} #{index}: missing or invalid field `{field}`")]
    MissingField {
        kind: RecordKind,
        index: usize,
        field: &'static str,
    },

    #[error("{kind} {id}: invalid `{field}`: {reason}")]
    InvalidField {
        kind: RecordKind,
        id: String,
        field: &'static str,
        reason: String,
    },

    #[error("task {task_id} references unknown list {list_id}")]
    UnknownList { task_id: String, list_id: String },

    #[error("list {list_id} has no column at index {index}")]
    MissingColumn { list_id: String, index: usize },

    #[error("task row {0} disappeared during the import")]
    MissingTaskRow(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Outcome of a failed import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read export file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse export file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("export document is malformed: {0}")]
    Document(String),

    #[error("target database is missing table(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("import failed during the {pass} pass, rolled back: {source}")]
    Transform {
        pass: Pass,
        #[source]
        source: TransformError,
    },
}

impl ImportError {
    /// True when the failure aborted an open transaction.
    pub fn rolled_back(&self) -> bool {
        matches!(self, ImportError::Transform { .. })
    }
}

/// Result type for import operations.
pub type ImportResult<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_names_pass_and_record() {
        let err = ImportError::Transform {
            pass: Pass::Tasks,
            source: TransformError::UnknownList {
                task_id: "10".into(),
                list_id: "99".into(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("tasks pass"));
        assert!(message.contains("task 10 references unknown list 99"));
        assert!(err.rolled_back());
    }

    #[test]
    fn missing_field_message() {
        let err = TransformError::MissingField {
            kind: RecordKind::List,
            index: 3,
            field: "title",
        };
        assert_eq!(err.to_string(), "list #3: missing or invalid field `title`");
    }

    #[test]
    fn io_errors_do_not_roll_back() {
        let err = ImportError::Io {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        };
        assert!(!err.rolled_back());
        assert!(err.to_string().contains("missing.json"));
    }
}
