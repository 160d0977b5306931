//! Source id to target id tables built while importing.

use crate::export::SourceId;
use std::collections::HashMap;

/// Target rows created for one source list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectColumns {
    pub project_id: i64,
    /// Column ids in template order.
    pub column_ids: Vec<i64>,
}

impl ProjectColumns {
    /// Column id at a template index.
    pub fn column(&self, index: usize) -> Option<i64> {
        self.column_ids.get(index).copied()
    }
}

/// Source list id -> project and its columns.
#[derive(Debug, Clone, Default)]
pub struct ListRemap(HashMap<SourceId, ProjectColumns>);

impl ListRemap {
    /// Record a list. A repeated source id points at the latest project.
    pub fn insert(&mut self, list_id: SourceId, target: ProjectColumns) {
        self.0.insert(list_id, target);
    }

    pub fn get(&self, list_id: &SourceId) -> Option<&ProjectColumns> {
        self.0.get(list_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Source task id -> task row id.
#[derive(Debug, Clone, Default)]
pub struct TaskRemap(HashMap<SourceId, i64>);

impl TaskRemap {
    pub fn insert(&mut self, task_id: SourceId, row_id: i64) {
        self.0.insert(task_id, row_id);
    }

    pub fn get(&self, task_id: &SourceId) -> Option<i64> {
        self.0.get(task_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
