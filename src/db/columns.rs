//! Workflow columns of a project.

use rusqlite::{Connection, params};

/// A column row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: i64,
    pub title: String,
    pub position: i64,
    pub project_id: i64,
    pub task_limit: i64,
}

/// Insert a column, returning its id.
pub fn insert_column(
    conn: &Connection,
    project_id: i64,
    title: &str,
    position: i64,
    task_limit: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO columns (title, position, project_id, task_limit)
         VALUES (?1, ?2, ?3, ?4)",
        params![title, position, project_id, task_limit],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Columns of a project, by position.
pub fn list_columns(conn: &Connection, project_id: i64) -> rusqlite::Result<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, position, project_id, task_limit
         FROM columns WHERE project_id = ?1 ORDER BY position, id",
    )?;
    let columns = stmt
        .query_map([project_id], |row| {
            Ok(Column {
                id: row.get(0)?,
                title: row.get(1)?,
                position: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                project_id: row.get(3)?,
                task_limit: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::db::projects::{NewProject, insert_project};

    #[test]
    fn columns_are_listed_by_position() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let project_id = insert_project(
                conn,
                &NewProject {
                    name: "Work".into(),
                    is_public: false,
                    token: String::new(),
                    last_modified: 0,
                },
            )?;
            insert_column(conn, project_id, "Done", 2, 0)?;
            insert_column(conn, project_id, "Pending", 1, 3)?;

            let columns = list_columns(conn, project_id)?;
            let titles: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
            assert_eq!(titles, vec!["Pending", "Done"]);
            assert_eq!(columns[0].task_limit, 3);
            assert!(list_columns(conn, project_id + 1)?.is_empty());
            Ok::<_, rusqlite::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn column_requires_existing_project() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| insert_column(conn, 999, "Pending", 1, 0));
        assert!(result.is_err());
    }
}
