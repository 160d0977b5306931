//! Task rows.

use rusqlite::{Connection, OptionalExtension, Row, params};

/// A task row.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date_creation: i64,
    pub date_modification: i64,
    pub date_completed: Option<i64>,
    pub date_due: Option<i64>,
    pub color_id: String,
    pub project_id: i64,
    pub column_id: i64,
    pub owner_id: i64,
    pub is_active: bool,
    pub score: i64,
}

/// Values for a new task row.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub date_creation: i64,
    pub date_modification: i64,
    pub date_completed: Option<i64>,
    pub date_due: Option<i64>,
    pub color_id: &'static str,
    pub project_id: i64,
    pub column_id: i64,
    pub owner_id: i64,
    pub is_active: bool,
    pub score: i64,
}

const TASK_COLUMNS: &str = "id, title, description, date_creation, date_modification,
    date_completed, date_due, color_id, project_id, column_id, owner_id, is_active, score";

/// Insert a task, returning its id.
pub fn insert_task(conn: &Connection, task: &NewTask) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tasks (
            title, description, date_creation, date_modification,
            date_completed, date_due, color_id, project_id, column_id,
            owner_id, is_active, score
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            task.title,
            task.description,
            task.date_creation,
            task.date_modification,
            task.date_completed,
            task.date_due,
            task.color_id,
            task.project_id,
            task.column_id,
            task.owner_id,
            task.is_active,
            task.score,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Find a task by id.
pub fn find_task(conn: &Connection, id: i64) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
        [id],
        parse_task_row,
    )
    .optional()
}

/// Replace a task's description. Returns false if no row has this id.
pub fn update_task_description(
    conn: &Connection,
    id: i64,
    description: &str,
) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE tasks SET description = ?1 WHERE id = ?2",
        params![description, id],
    )?;
    Ok(updated > 0)
}

/// Tasks of a project in insertion order.
pub fn list_tasks(conn: &Connection, project_id: i64) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY id",
        TASK_COLUMNS
    ))?;
    let tasks = stmt
        .query_map([project_id], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        date_creation: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        date_modification: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        date_completed: row.get(5)?,
        date_due: row.get(6)?,
        color_id: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        project_id: row.get(8)?,
        column_id: row.get(9)?,
        owner_id: row.get::<_, Option<i64>>(10)?.unwrap_or(0),
        is_active: row.get::<_, Option<bool>>(11)?.unwrap_or(true),
        score: row.get::<_, Option<i64>>(12)?.unwrap_or(0),
    })
}
