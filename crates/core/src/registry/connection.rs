//! Scoped registry sessions.
//!
//! Every logical unit of work opens its own connection, applies the pragmas,
//! runs, and closes the connection again. Nothing holds a handle across a
//! monitoring run.

use super::migrations;
use crate::Error;
use std::path::{Path, PathBuf};
use tokio_rusqlite::{Connection, rusqlite};

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA busy_timeout=5000;
                       PRAGMA foreign_keys=ON;";

/// Handle to the site registry database file.
#[derive(Clone, Debug)]
pub struct SiteDb {
    path: PathBuf,
}

impl SiteDb {
    /// Open the registry at `path`, creating the file and schema if absent.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let db = Self { path: path.as_ref().to_path_buf() };

        if let Some(parent) = db.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::MigrationFailed(format!("cannot create {}: {e}", parent.display())))?;
        }

        let conn = db.connect().await?;
        let migrated = migrations::run(&conn).await;
        close(conn).await;
        migrated?;

        tracing::debug!(path = %db.path.display(), "site registry ready");
        Ok(db)
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` on a fresh connection that is closed afterwards regardless of
    /// the outcome. Callers that write open a transaction inside `f`; an
    /// uncommitted transaction rolls back when it is dropped.
    pub(crate) async fn session<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connect().await?;
        let result = conn.call(f).await.map_err(Error::from);
        close(conn).await;
        result
    }

    async fn connect(&self) -> Result<Connection, Error> {
        let conn = Connection::open(&self.path)
            .await
            .map_err(|e| Error::Database(e.into()))?;

        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        Ok(conn)
    }
}

async fn close(conn: Connection) {
    if let Err(e) = conn.close().await {
        tracing::debug!("closing registry connection: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jobs.db");

        let db = SiteDb::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());

        let tables: i64 = db
            .session(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='websites'",
                    [],
                    |row| row.get(0),
                )
                .map_err(Error::from)
            })
            .await
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, b"not a directory").await.unwrap();

        let result = SiteDb::open(blocker.join("jobs.db")).await;
        assert!(matches!(result, Err(Error::MigrationFailed(msg)) if msg.contains("cannot create")));
    }

    #[tokio::test]
    async fn test_reopen_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        SiteDb::open(&path).await.unwrap();
        let db = SiteDb::open(&path).await.unwrap();

        let version: i64 = db
            .session(|conn| {
                conn.query_row("SELECT MAX(version) FROM _migrations", [], |row| row.get(0))
                    .map_err(Error::from)
            })
            .await
            .unwrap();
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn test_session_error_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let db = SiteDb::open(dir.path().join("jobs.db")).await.unwrap();

        let result: Result<(), Error> = db
            .session(|conn| {
                conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
