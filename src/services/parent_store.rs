//! Durable key-value store for parent passages.
//!
//! One SQLite file per collection. The store is deliberately dumb: ids in,
//! passages out. It is never consulted for ranking, only for context
//! reconstruction after a child-level vector search, and a lookup of an
//! absent id is an ordinary outcome (`None`), not an error — the vector
//! index and this store are not transactionally joined, so readers must
//! tolerate stale references.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::ParentStoreError;
use crate::models::ParentChunk;

/// Storage contract for parent passages.
pub trait ParentStore: Send + Sync {
    /// Insert or replace a batch of parents.
    fn put(&self, parents: &[ParentChunk]) -> Result<(), ParentStoreError>;

    /// Fetch parents by id. Order matches the input; absent ids map to
    /// `None`.
    fn get(&self, ids: &[String]) -> Result<Vec<Option<ParentChunk>>, ParentStoreError>;

    /// Delete parents by id. Deleting an absent id is a no-op.
    fn delete(&self, ids: &[String]) -> Result<(), ParentStoreError>;

    /// Delete every parent belonging to one source document.
    fn delete_by_source(&self, source_id: &str) -> Result<(), ParentStoreError>;

    /// Drop all rows. Used when a collection is rebuilt from scratch.
    fn clear(&self) -> Result<(), ParentStoreError>;

    fn count(&self) -> Result<u64, ParentStoreError>;
}

/// SQLite-backed [`ParentStore`].
pub struct SqliteParentStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteParentStore {
    /// Open (creating if necessary) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParentStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ParentStoreError::OpenError {
                path: path.clone(),
                message: e.to_string(),
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| ParentStoreError::OpenError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS parent_chunks (
                id         TEXT PRIMARY KEY,
                text       TEXT NOT NULL,
                source_id  TEXT NOT NULL,
                year       INTEGER NOT NULL,
                collection TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_parent_source ON parent_chunks (source_id);",
        )
        .map_err(|e| ParentStoreError::OpenError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ParentStore for SqliteParentStore {
    fn put(&self, parents: &[ParentChunk]) -> Result<(), ParentStoreError> {
        if parents.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().expect("parent store lock poisoned");
        let tx = conn
            .transaction()
            .map_err(ParentStoreError::WriteError)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR REPLACE INTO parent_chunks
                     (id, text, source_id, year, collection, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(ParentStoreError::WriteError)?;
            for parent in parents {
                stmt.execute(params![
                    parent.id,
                    parent.text,
                    parent.source_id,
                    parent.year,
                    parent.collection,
                    parent.created_at,
                ])
                .map_err(ParentStoreError::WriteError)?;
            }
        }
        tx.commit().map_err(ParentStoreError::WriteError)
    }

    fn get(&self, ids: &[String]) -> Result<Vec<Option<ParentChunk>>, ParentStoreError> {
        let conn = self.conn.lock().expect("parent store lock poisoned");
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, text, source_id, year, collection, created_at
                 FROM parent_chunks WHERE id = ?1",
            )
            .map_err(ParentStoreError::ReadError)?;

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let row = stmt
                .query_row(params![id], |row| {
                    Ok(ParentChunk {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        source_id: row.get(2)?,
                        year: row.get(3)?,
                        collection: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .optional()
                .map_err(ParentStoreError::ReadError)?;
            out.push(row);
        }
        Ok(out)
    }

    fn delete(&self, ids: &[String]) -> Result<(), ParentStoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().expect("parent store lock poisoned");
        let tx = conn
            .transaction()
            .map_err(ParentStoreError::DeleteError)?;
        {
            let mut stmt = tx
                .prepare_cached("DELETE FROM parent_chunks WHERE id = ?1")
                .map_err(ParentStoreError::DeleteError)?;
            for id in ids {
                stmt.execute(params![id])
                    .map_err(ParentStoreError::DeleteError)?;
            }
        }
        tx.commit().map_err(ParentStoreError::DeleteError)
    }

    fn delete_by_source(&self, source_id: &str) -> Result<(), ParentStoreError> {
        let conn = self.conn.lock().expect("parent store lock poisoned");
        conn.execute(
            "DELETE FROM parent_chunks WHERE source_id = ?1",
            params![source_id],
        )
        .map_err(ParentStoreError::DeleteError)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ParentStoreError> {
        let conn = self.conn.lock().expect("parent store lock poisoned");
        conn.execute("DELETE FROM parent_chunks", [])
            .map_err(ParentStoreError::DeleteError)?;
        Ok(())
    }

    fn count(&self) -> Result<u64, ParentStoreError> {
        let conn = self.conn.lock().expect("parent store lock poisoned");
        conn.query_row("SELECT COUNT(*) FROM parent_chunks", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as u64)
        .map_err(ParentStoreError::ReadError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentMeta};

    fn parent(source_id: &str, index: usize, text: &str) -> ParentChunk {
        let doc = Document::new(
            String::new(),
            DocumentMeta {
                source_id: source_id.to_string(),
                year: 2020,
                language: "en".to_string(),
                collection: "demo".to_string(),
            },
        );
        ParentChunk::new(&doc, index, text.to_string())
    }

    #[test]
    fn test_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteParentStore::open(dir.path().join("docstore.db")).unwrap();

        let a = parent("10.1/a", 0, "first passage");
        let b = parent("10.1/a", 1, "second passage");
        store.put(&[a.clone(), b.clone()]).unwrap();

        let got = store.get(&[b.id.clone(), a.id.clone()]).unwrap();
        assert_eq!(got, vec![Some(b), Some(a)]);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_absent_id_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteParentStore::open(dir.path().join("docstore.db")).unwrap();

        let a = parent("10.1/a", 0, "passage");
        store.put(&[a.clone()]).unwrap();

        let got = store
            .get(&["missing".to_string(), a.id.clone()])
            .unwrap();
        assert_eq!(got[0], None);
        assert_eq!(got[1], Some(a));
    }

    #[test]
    fn test_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteParentStore::open(dir.path().join("docstore.db")).unwrap();

        let a = parent("10.1/a", 0, "passage");
        store.put(&[a.clone()]).unwrap();
        store.put(&[a.clone()]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_and_delete_by_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteParentStore::open(dir.path().join("docstore.db")).unwrap();

        let a = parent("10.1/a", 0, "a0");
        let b = parent("10.1/a", 1, "a1");
        let c = parent("10.1/b", 0, "b0");
        store.put(&[a.clone(), b.clone(), c.clone()]).unwrap();

        store.delete(&[a.id.clone(), "missing".to_string()]).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.delete_by_source("10.1/a").unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(&[c.id.clone()]).unwrap()[0], Some(c));
    }

    #[test]
    fn test_durable_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstore.db");

        let a = parent("10.1/a", 0, "persisted");
        {
            let store = SqliteParentStore::open(&path).unwrap();
            store.put(&[a.clone()]).unwrap();
        }

        let store = SqliteParentStore::open(&path).unwrap();
        assert_eq!(store.get(&[a.id.clone()]).unwrap()[0], Some(a));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteParentStore::open(dir.path().join("docstore.db")).unwrap();
        store
            .put(&[parent("10.1/a", 0, "x"), parent("10.1/b", 0, "y")])
            .unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
