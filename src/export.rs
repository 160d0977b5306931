//! Export document loading.
//!
//! The whole export is read into memory as generic JSON. Records are only
//! interpreted when a pass reaches them, so a missing field fails the pass
//! that needs it rather than the load.
//!
//! Two shapes are accepted:
//! - flat: `{ "lists": [...], "tasks": [...] }`, sub-tasks carry `parent_id`
//! - Wunderlist backup: `{ "data": { "lists", "tasks", "subtasks", "notes" } }`,
//!   notes are folded into their task and `subtasks` kept as sub-tasks

use crate::error::{ImportError, ImportResult, RecordKind, TransformError};
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Reserved list id of the synthetic inbox.
pub const INBOX_LIST_ID: &str = "__inbox__";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Identifier of a record on the export side. Numeric and string ids are
/// both kept as their decimal/string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn inbox() -> Self {
        Self(INBOX_LIST_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The loaded export.
#[derive(Debug, Clone, Default)]
pub struct ExportDocument {
    lists: Vec<Value>,
    tasks: Vec<Value>,
    /// Sub-tasks of a backup export, kept apart from `tasks` so an entry
    /// without a parent never reads as a top-level task.
    subtasks: Vec<Value>,
}

impl ExportDocument {
    /// Read an export from disk. Gzipped files are detected by magic bytes.
    pub fn from_file(path: &Path) -> ImportResult<Self> {
        let io_err = |source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        };

        let raw = std::fs::read(path).map_err(io_err)?;
        let bytes = if raw.starts_with(&GZIP_MAGIC) {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(raw.as_slice())
                .read_to_end(&mut decoded)
                .map_err(io_err)?;
            decoded
        } else {
            raw
        };

        let root: Value = serde_json::from_slice(&bytes).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(root)
    }

    /// Parse an export held in memory.
    pub fn from_json(json: &str) -> ImportResult<Self> {
        let root: Value = serde_json::from_str(json).map_err(|source| ImportError::Parse {
            path: "<memory>".into(),
            source,
        })?;
        Self::from_value(root)
    }

    /// Build a document from an already parsed JSON root.
    ///
    /// Only the shape of the root is checked here: a non-object root, or a
    /// `data`/`lists`/`tasks`/`subtasks`/`notes` member of the wrong type, is
    /// reported as `ImportError::Document` before any transaction opens.
    /// Fields of individual records are read later by the pass that needs
    /// them.
    pub fn from_value(root: Value) -> ImportResult<Self> {
        let Value::Object(root) = root else {
            return Err(ImportError::Document("root must be a JSON object".into()));
        };

        match root.get("data") {
            Some(Value::Object(data)) => Self::from_backup(data),
            Some(_) => Err(ImportError::Document("`data` must be an object".into())),
            None => Ok(Self {
                lists: array_field(&root, "lists")?,
                tasks: array_field(&root, "tasks")?,
                subtasks: Vec::new(),
            }),
        }
    }

    /// Normalize the Wunderlist backup layout: notes become the `note` of
    /// their task (first one wins) and sub-tasks get a `parent_id` taken from
    /// their `task_id` (null when absent).
    fn from_backup(data: &Map<String, Value>) -> ImportResult<Self> {
        let lists = array_field(data, "lists")?;
        let mut tasks = array_field(data, "tasks")?;
        let notes = array_field(data, "notes")?;
        let subtasks = array_field(data, "subtasks")?;

        let mut notes_by_task: HashMap<SourceId, String> = HashMap::new();
        for note in &notes {
            let task_id = note.get("task_id").and_then(SourceId::from_value);
            let content = note.get("content").and_then(Value::as_str);
            if let (Some(task_id), Some(content)) = (task_id, content) {
                notes_by_task
                    .entry(task_id)
                    .or_insert_with(|| content.to_string());
            }
        }

        for task in tasks.iter_mut() {
            let Some(obj) = task.as_object_mut() else {
                continue;
            };
            if obj.get("note").is_some_and(|n| !n.is_null()) {
                continue;
            }
            let content = obj
                .get("id")
                .and_then(SourceId::from_value)
                .and_then(|id| notes_by_task.get(&id));
            if let Some(content) = content {
                obj.insert("note".into(), Value::String(content.clone()));
            }
        }

        let subtasks = subtasks
            .into_iter()
            .map(|mut subtask| {
                if let Some(obj) = subtask.as_object_mut() {
                    let parent = obj.get("task_id").cloned().unwrap_or(Value::Null);
                    obj.insert("parent_id".into(), parent);
                }
                subtask
            })
            .collect();

        Ok(Self {
            lists,
            tasks,
            subtasks,
        })
    }

    pub fn lists(&self) -> &[Value] {
        &self.lists
    }

    pub fn tasks(&self) -> &[Value] {
        &self.tasks
    }

    /// Every sub-task with its index in the array it came from: flat tasks
    /// carrying a `parent_id` first, then backup `subtasks[]` entries.
    pub fn subtasks(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| is_subtask(task))
            .chain(self.subtasks.iter().enumerate())
    }

    /// The export's lists followed by the synthetic inbox list.
    pub fn lists_with_inbox(&self, inbox_title: &str) -> Vec<Value> {
        let mut lists = self.lists.clone();
        lists.push(json!({ "id": INBOX_LIST_ID, "title": inbox_title }));
        lists
    }
}

fn array_field(obj: &Map<String, Value>, key: &str) -> ImportResult<Vec<Value>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(ImportError::Document(format!("`{}` must be an array", key))),
    }
}

/// True for task records that are really sub-tasks.
pub fn is_subtask(task: &Value) -> bool {
    task.get("parent_id").is_some_and(|p| !p.is_null())
}

/// A list, as read by the projects pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRecord {
    pub id: SourceId,
    pub title: String,
    pub public: bool,
    /// Wunderlist's own inbox list (`list_type: "inbox"`).
    pub is_inbox: bool,
}

impl ListRecord {
    pub fn from_value(index: usize, value: &Value) -> Result<Self, TransformError> {
        let missing = |field| TransformError::MissingField {
            kind: RecordKind::List,
            index,
            field,
        };
        let id = value
            .get("id")
            .and_then(SourceId::from_value)
            .ok_or_else(|| missing("id"))?;
        let title = get_str(value, "title").ok_or_else(|| missing("title"))?;

        Ok(Self {
            id,
            title: title.to_string(),
            public: get_bool(value, "public"),
            is_inbox: get_str(value, "list_type") == Some("inbox"),
        })
    }
}

/// A top-level task, as read by the tasks pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: SourceId,
    pub title: String,
    pub note: Option<String>,
    pub created_at: i64,
    pub starred: bool,
    /// `None` when the task names no list; it then lands in the inbox.
    pub list_id: Option<SourceId>,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub due_date: Option<i64>,
}

impl TaskRecord {
    pub fn from_value(index: usize, value: &Value) -> Result<Self, TransformError> {
        let missing = |field| TransformError::MissingField {
            kind: RecordKind::Task,
            index,
            field,
        };
        let id = value
            .get("id")
            .and_then(SourceId::from_value)
            .ok_or_else(|| missing("id"))?;
        let invalid = |field, reason| TransformError::InvalidField {
            kind: RecordKind::Task,
            id: id.to_string(),
            field,
            reason,
        };

        let title = get_str(value, "title").ok_or_else(|| missing("title"))?;
        let created_at = match value.get("created_at") {
            None | Some(Value::Null) => return Err(missing("created_at")),
            Some(v) => parse_timestamp(v).map_err(|r| invalid("created_at", r))?,
        };
        let completed_at = optional_timestamp(value, "completed_at")
            .map_err(|r| invalid("completed_at", r))?;
        let due_date =
            optional_timestamp(value, "due_date").map_err(|r| invalid("due_date", r))?;

        let list_id = match value.get("list_id") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                SourceId::from_value(v)
                    .ok_or_else(|| invalid("list_id", format!("unsupported id {}", v)))?,
            ),
        };

        Ok(Self {
            id,
            title: title.to_string(),
            note: get_str(value, "note").map(str::to_string),
            created_at,
            starred: get_bool(value, "starred"),
            list_id,
            completed: completed_at.is_some() || get_bool(value, "completed"),
            completed_at,
            due_date,
        })
    }
}

/// A sub-task, as read by the sub-tasks pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskRecord {
    /// `None` for a sub-task that names no parent.
    pub parent_id: Option<SourceId>,
    pub title: String,
    pub completed: bool,
}

impl SubtaskRecord {
    pub fn from_value(index: usize, value: &Value) -> Result<Self, TransformError> {
        let missing = |field| TransformError::MissingField {
            kind: RecordKind::Subtask,
            index,
            field,
        };
        let parent_id = match value.get("parent_id") {
            None | Some(Value::Null) => None,
            Some(v) => Some(SourceId::from_value(v).ok_or_else(|| missing("parent_id"))?),
        };
        let title = get_str(value, "title").ok_or_else(|| missing("title"))?;
        let completed = value.get("completed_at").is_some_and(|v| !v.is_null())
            || get_bool(value, "completed");

        Ok(Self {
            parent_id,
            title: title.to_string(),
            completed,
        })
    }
}

fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn get_bool(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn optional_timestamp(value: &Value, key: &str) -> Result<Option<i64>, String> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_timestamp(v).map(Some),
    }
}

/// Convert an export timestamp to unix seconds.
///
/// Accepts RFC 3339 strings, bare `YYYY-MM-DD` dates (midnight UTC) and
/// integer seconds.
pub fn parse_timestamp(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("{} is not an integer timestamp", n)),
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.timestamp());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp())
                .ok_or_else(|| format!("cannot parse date {:?}", s))
        }
        other => Err(format!("expected a date, found {}", other)),
    }
}
