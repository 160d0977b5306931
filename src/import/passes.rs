//! The three transactional passes.
//!
//! Each pass reads export records lazily, writes through the repository
//! functions and hands its remap table to the next pass.

use super::ImportSummary;
use super::remap::{ListRemap, ProjectColumns, TaskRemap};
use super::transform::{append_line, checklist_line, color_for, description_from_note};
use crate::config::ImportConfig;
use crate::db::columns::insert_column;
use crate::db::projects::{NewProject, generate_token, insert_project};
use crate::db::tasks::{NewTask, find_task, insert_task, update_task_description};
use crate::error::TransformError;
use crate::export::{ListRecord, SourceId, SubtaskRecord, TaskRecord, is_subtask};
use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, info};

/// Settings shared by every pass of one run.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    pub config: &'a ImportConfig,
    /// Run timestamp, unix seconds.
    pub now: i64,
}

/// Lists to projects, each with the configured columns. The Wunderlist
/// inbox list is named after the configured inbox title.
pub fn import_projects(
    conn: &Connection,
    lists: &[Value],
    ctx: &PassContext<'_>,
    summary: &mut ImportSummary,
) -> Result<ListRemap, TransformError> {
    let mut remap = ListRemap::default();

    for (index, value) in lists.iter().enumerate() {
        let list = ListRecord::from_value(index, value)?;
        let name = if list.is_inbox {
            ctx.config.inbox_title.clone()
        } else {
            list.title.clone()
        };

        let project_id = insert_project(
            conn,
            &NewProject {
                name: name.clone(),
                is_public: list.public,
                token: generate_token(),
                last_modified: ctx.now,
            },
        )?;
        summary.projects += 1;
        info!(project_id, "> Projects > {}", name);

        let mut column_ids = Vec::with_capacity(ctx.config.columns.len());
        for template in &ctx.config.columns {
            let column_id = insert_column(
                conn,
                project_id,
                &template.title,
                template.position,
                template.task_limit,
            )?;
            summary.columns += 1;
            info!(column_id, "> Projects > {} > Columns > {}", name, template.title);
            column_ids.push(column_id);
        }

        remap.insert(
            list.id,
            ProjectColumns {
                project_id,
                column_ids,
            },
        );
    }

    Ok(remap)
}

/// Top-level tasks to task rows. A task naming an unknown list fails the pass.
pub fn import_tasks(
    conn: &Connection,
    tasks: &[Value],
    lists: &ListRemap,
    ctx: &PassContext<'_>,
    summary: &mut ImportSummary,
) -> Result<TaskRemap, TransformError> {
    let mut remap = TaskRemap::default();

    for (index, value) in tasks.iter().enumerate() {
        if is_subtask(value) {
            continue;
        }
        let task = TaskRecord::from_value(index, value)?;

        let list_id = task.list_id.clone().unwrap_or_else(SourceId::inbox);
        let target = lists
            .get(&list_id)
            .ok_or_else(|| TransformError::UnknownList {
                task_id: task.id.to_string(),
                list_id: list_id.to_string(),
            })?;

        let column_index = if task.completed {
            ctx.config.completed_column
        } else {
            ctx.config.default_column
        };
        let column_id = target
            .column(column_index)
            .ok_or_else(|| TransformError::MissingColumn {
                list_id: list_id.to_string(),
                index: column_index,
            })?;

        let date_completed = if task.completed {
            Some(task.completed_at.unwrap_or(ctx.now))
        } else {
            None
        };

        let row_id = insert_task(
            conn,
            &NewTask {
                title: task.title.clone(),
                description: description_from_note(task.note.as_deref()),
                date_creation: task.created_at,
                date_modification: ctx.now,
                date_completed,
                date_due: task.due_date,
                color_id: color_for(task.starred),
                project_id: target.project_id,
                column_id,
                owner_id: ctx.config.owner_id,
                is_active: !task.completed,
                score: 0,
            },
        )?;
        summary.tasks += 1;
        info!(task_id = row_id, "> Main tasks > {}", task.title);

        remap.insert(task.id, row_id);
    }

    Ok(remap)
}

/// Sub-tasks to checklist lines on their parent task. Sub-tasks naming no
/// parent, or a parent that was not imported, are skipped.
pub fn import_subtasks<'v>(
    conn: &Connection,
    subtasks: impl IntoIterator<Item = (usize, &'v Value)>,
    parents: &TaskRemap,
    summary: &mut ImportSummary,
) -> Result<(), TransformError> {
    for (index, value) in subtasks {
        let subtask = SubtaskRecord::from_value(index, value)?;

        let parent_row = subtask.parent_id.as_ref().and_then(|id| parents.get(id));
        let Some(parent_row) = parent_row else {
            match &subtask.parent_id {
                Some(parent) => debug!(
                    parent = %parent,
                    "> Sub tasks > {} (orphaned, skipped)",
                    subtask.title
                ),
                None => debug!("> Sub tasks > {} (no parent, skipped)", subtask.title),
            }
            summary.subtasks_skipped += 1;
            continue;
        };

        let parent = find_task(conn, parent_row)?.ok_or(TransformError::MissingTaskRow(parent_row))?;
        let line = checklist_line(&subtask.title, subtask.completed);
        let description = append_line(&parent.description, &line);
        if !update_task_description(conn, parent_row, &description)? {
            return Err(TransformError::MissingTaskRow(parent_row));
        }
        summary.subtasks_appended += 1;
        info!(task_id = parent_row, "> Sub tasks > {}", subtask.title);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::db::columns::list_columns;
    use crate::db::projects::find_project;
    use crate::db::tasks::list_tasks;
    use serde_json::json;

    fn ctx(config: &ImportConfig) -> PassContext<'_> {
        PassContext { config, now: 1_000 }
    }

    #[test]
    fn projects_pass_creates_columns_in_template_order() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();
        let mut summary = ImportSummary::default();
        let lists = vec![json!({"id": 1, "title": "Work"}), json!({"id": "x", "title": "Home"})];

        let remap = db
            .with_conn(|conn| import_projects(conn, &lists, &ctx(&config), &mut summary))
            .unwrap();

        assert_eq!(remap.len(), 2);
        assert_eq!(summary.projects, 2);
        assert_eq!(summary.columns, 8);

        let work = remap.get(&SourceId::new("1")).unwrap();
        let columns = db.with_conn(|conn| list_columns(conn, work.project_id)).unwrap();
        let titles: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Pending", "Ready", "In progress", "Done"]);
        let ids: Vec<i64> = columns.iter().map(|c| c.id).collect();
        assert_eq!(ids, work.column_ids);
    }

    #[test]
    fn projects_pass_names_wunderlist_inbox_after_config() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig {
            inbox_title: "Eingang".into(),
            ..ImportConfig::default()
        };
        let mut summary = ImportSummary::default();
        let lists = vec![
            json!({"id": 1, "title": "inbox", "list_type": "inbox"}),
            json!({"id": 2, "title": "Work", "list_type": "list"}),
        ];

        let remap = db
            .with_conn(|conn| import_projects(conn, &lists, &ctx(&config), &mut summary))
            .unwrap();

        let inbox = remap.get(&SourceId::new("1")).unwrap();
        let work = remap.get(&SourceId::new("2")).unwrap();
        let names = db
            .with_conn(|conn| {
                Ok::<_, rusqlite::Error>((
                    find_project(conn, inbox.project_id)?.unwrap().name,
                    find_project(conn, work.project_id)?.unwrap().name,
                ))
            })
            .unwrap();
        assert_eq!(names, ("Eingang".to_string(), "Work".to_string()));
    }

    #[test]
    fn projects_pass_fails_on_list_without_title() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();
        let mut summary = ImportSummary::default();
        let lists = vec![json!({"id": 1})];

        let err = db
            .with_conn(|conn| import_projects(conn, &lists, &ctx(&config), &mut summary))
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingField { field: "title", .. }));
    }

    #[test]
    fn tasks_pass_picks_column_and_color() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();
        let mut summary = ImportSummary::default();
        let lists = vec![json!({"id": 1, "title": "Work"})];
        let tasks = vec![
            json!({"id": 10, "title": "open", "list_id": 1, "created_at": 5, "starred": true}),
            json!({"id": 11, "title": "done", "list_id": 1, "created_at": 6, "completed_at": 7}),
            json!({"id": 12, "title": "sub", "parent_id": 10}),
        ];

        let (lists_remap, tasks_remap) = db
            .with_conn(|conn| {
                let l = import_projects(conn, &lists, &ctx(&config), &mut summary)?;
                let t = import_tasks(conn, &tasks, &l, &ctx(&config), &mut summary)?;
                Ok::<_, TransformError>((l, t))
            })
            .unwrap();

        assert_eq!(summary.tasks, 2);
        assert_eq!(tasks_remap.len(), 2);
        assert!(tasks_remap.get(&SourceId::new("12")).is_none());

        let work = lists_remap.get(&SourceId::new("1")).unwrap();
        let rows = db.with_conn(|conn| list_tasks(conn, work.project_id)).unwrap();
        assert_eq!(rows[0].column_id, work.column_ids[0]);
        assert_eq!(rows[0].color_id, "red");
        assert!(rows[0].is_active);
        assert_eq!(rows[0].date_completed, None);
        assert_eq!(rows[1].column_id, work.column_ids[3]);
        assert_eq!(rows[1].color_id, "yellow");
        assert!(!rows[1].is_active);
        assert_eq!(rows[1].date_completed, Some(7));
        assert_eq!(rows[1].date_modification, 1_000);
    }

    #[test]
    fn tasks_pass_rejects_unknown_list() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();
        let mut summary = ImportSummary::default();
        let tasks = vec![json!({"id": 10, "title": "t", "list_id": 99, "created_at": 5})];

        let err = db
            .with_conn(|conn| {
                import_tasks(conn, &tasks, &ListRemap::default(), &ctx(&config), &mut summary)
            })
            .unwrap_err();
        match err {
            TransformError::UnknownList { task_id, list_id } => {
                assert_eq!(task_id, "10");
                assert_eq!(list_id, "99");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn subtasks_pass_appends_in_order_and_skips_orphans() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();
        let mut summary = ImportSummary::default();
        let lists = vec![json!({"id": 1, "title": "Work"})];
        let tasks = vec![
            json!({"id": 11, "title": "a", "parent_id": 10}),
            json!({"id": 10, "title": "Buy milk", "list_id": 1, "created_at": 5, "note": "n"}),
            json!({"id": 12, "title": "b", "parent_id": 10, "completed_at": "2015-01-01"}),
            json!({"id": 13, "title": "lost", "parent_id": 404}),
        ];

        let parent_row = db
            .with_conn(|conn| {
                let l = import_projects(conn, &lists, &ctx(&config), &mut summary)?;
                let t = import_tasks(conn, &tasks, &l, &ctx(&config), &mut summary)?;
                let subtasks = tasks.iter().enumerate().filter(|(_, v)| is_subtask(v));
                import_subtasks(conn, subtasks, &t, &mut summary)?;
                Ok::<_, TransformError>(t.get(&SourceId::new("10")).unwrap())
            })
            .unwrap();

        assert_eq!(summary.subtasks_appended, 2);
        assert_eq!(summary.subtasks_skipped, 1);
        let parent = db.with_conn(|conn| find_task(conn, parent_row)).unwrap().unwrap();
        assert_eq!(parent.description, "n\n  - [ ] a\n  - [X] b");
    }

    #[test]
    fn subtasks_pass_skips_entries_without_parent() {
        let db = Database::open_in_memory().unwrap();
        let mut summary = ImportSummary::default();
        let subtasks = vec![
            json!({"id": 5, "title": "stray"}),
            json!({"id": 6, "title": "null parent", "parent_id": null}),
        ];

        db.with_conn(|conn| {
            import_subtasks(conn, subtasks.iter().enumerate(), &TaskRemap::default(), &mut summary)
        })
        .unwrap();

        assert_eq!(summary.subtasks_skipped, 2);
        assert_eq!(summary.subtasks_appended, 0);
        assert_eq!(db.count_rows("tasks").unwrap(), 0);
    }
}
