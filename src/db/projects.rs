//! Project rows.

use rand::Rng;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Bytes of randomness behind a project token (rendered as hex).
pub const TOKEN_BYTES: usize = 30;

/// A project row.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub is_public: bool,
    pub token: String,
    pub last_modified: i64,
}

/// Values for a new project row.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub is_public: bool,
    pub token: String,
    pub last_modified: i64,
}

/// Generate the public-link token of a project.
///
/// Uniqueness is not checked against existing rows.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; TOKEN_BYTES] = rng.random();
    hex::encode(bytes)
}

/// Insert an active project, returning its id.
pub fn insert_project(conn: &Connection, project: &NewProject) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO projects (name, is_active, is_public, token, last_modified)
         VALUES (?1, 1, ?2, ?3, ?4)",
        params![
            project.name,
            project.is_public,
            project.token,
            project.last_modified
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Find a project by id.
pub fn find_project(conn: &Connection, id: i64) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        "SELECT id, name, is_active, is_public, token, last_modified
         FROM projects WHERE id = ?1",
        [id],
        parse_project_row,
    )
    .optional()
}

/// All projects in insertion order.
pub fn list_projects(conn: &Connection) -> rusqlite::Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, is_active, is_public, token, last_modified
         FROM projects ORDER BY id",
    )?;
    let projects = stmt
        .query_map([], parse_project_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(projects)
}

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        is_active: row.get::<_, Option<bool>>(2)?.unwrap_or(true),
        is_public: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
        token: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        last_modified: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
    })
}
