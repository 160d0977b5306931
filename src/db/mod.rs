//! Database layer for the Kanboard target store.
//!
//! Repository functions take a plain `&Connection` so they run the same way
//! against a connection or an open `Transaction`.

pub mod columns;
pub mod projects;
pub mod tasks;

use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Tables the importer writes to.
pub const REQUIRED_TABLES: &[&str] = &["projects", "columns", "tasks"];

/// Database handle wrapping a SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open an existing database. The file must already exist.
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    /// Open or create the database at the given path and create the tables
    /// the importer needs.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let mut db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database with the schema applied (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        let mut db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
    }

    /// Run database migrations.
    fn run_migrations(&mut self) -> Result<()> {
        embedded::migrations::runner().run(&mut self.conn)?;
        Ok(())
    }

    /// Required tables absent from the database, in `REQUIRED_TABLES` order.
    pub fn missing_tables(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            if !stmt.exists([table])? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    /// Row count of a required table.
    pub fn count_rows(&self, table: &str) -> rusqlite::Result<i64> {
        // Table names cannot be bound; only known names are accepted.
        if !REQUIRED_TABLES.contains(&table) {
            return Err(rusqlite::Error::InvalidParameterName(table.to_string()));
        }
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
    }

    /// Execute a function with shared access to the connection.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        f(&self.conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
    {
        f(&mut self.conn)
    }
}

/// Get the current timestamp in seconds, the unit Kanboard stores.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn in_memory_has_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.missing_tables().unwrap().is_empty());
        assert_eq!(db.count_rows("projects").unwrap(), 0);
    }

    #[test]
    fn open_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        assert!(Database::open(temp.path().join("absent.sqlite")).is_err());
    }

    #[test]
    fn open_reports_missing_tables() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT);")
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.missing_tables().unwrap(), vec!["columns", "tasks"]);
    }

    #[test]
    fn create_is_repeatable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kanboard.sqlite");
        drop(Database::create(&path).unwrap());
        let db = Database::create(&path).unwrap();
        assert!(db.missing_tables().unwrap().is_empty());
    }

    #[test]
    fn count_rows_rejects_unknown_table() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.count_rows("sqlite_master").is_err());
    }
}
