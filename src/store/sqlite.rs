//! SQLite-backed record store.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::schema::{SCHEMA, SCHEMA_VERSION};
use super::{RecordStore, StoreError};
use crate::record::{NewRecord, Record, RecordId};

/// Record store backed by a single SQLite database.
///
/// The connection is blocking, so each operation is shipped to tokio's
/// blocking pool and the caller simply awaits the result.
#[derive(Clone)]
pub struct SqliteRecordStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
  /// Open or create the database at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path: PathBuf = path.as_ref().to_path_buf();

    tokio::task::spawn_blocking(move || {
      // Ensure parent directory exists
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
          StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
        })?;
      }

      let conn = Connection::open(&path).map_err(|e| {
        StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
      })?;

      info!(path = %path.display(), "record database opened");
      Self::from_connection(conn)
    })
    .await
    .map_err(|e| StoreError::Unavailable(format!("open task failed: {}", e)))?
  }

  /// Open a private in-memory database.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    let conn = Connection::open_in_memory()
      .map_err(|e| StoreError::Unavailable(format!("cannot open in-memory database: {}", e)))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    let version: i32 = conn
      .pragma_query_value(None, "user_version", |row| row.get(0))
      .map_err(|e| StoreError::Unavailable(format!("cannot read schema version: {}", e)))?;

    if version > SCHEMA_VERSION {
      return Err(StoreError::Unavailable(format!(
        "database schema version {} is newer than supported version {}",
        version, SCHEMA_VERSION
      )));
    }

    if version == 0 {
      conn
        .execute_batch(SCHEMA)
        .map_err(|e| StoreError::Unavailable(format!("failed to create schema: {}", e)))?;
      info!("record collection created");
    }

    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  /// Run `op` against the connection on the blocking pool.
  ///
  /// `fail` decides which error class a lock or task failure maps to.
  async fn run<T, F>(&self, fail: fn(String) -> StoreError, op: F) -> Result<T, StoreError>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);

    tokio::task::spawn_blocking(move || {
      let mut conn = conn
        .lock()
        .map_err(|e| fail(format!("lock poisoned: {}", e)))?;
      op(&mut conn)
    })
    .await
    .map_err(|e| fail(format!("storage task failed: {}", e)))?
  }
}

fn read_err(e: rusqlite::Error) -> StoreError {
  StoreError::Read(e.to_string())
}

fn write_err(e: rusqlite::Error) -> StoreError {
  StoreError::Write(e.to_string())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
  async fn add(&self, record: NewRecord) -> Result<RecordId, StoreError> {
    let id = self
      .run(StoreError::Write, move |conn| {
        let tx = conn.transaction().map_err(write_err)?;
        tx.execute(
          "INSERT INTO students (name, age) VALUES (?, ?)",
          params![record.name, record.age],
        )
        .map_err(write_err)?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(write_err)?;
        Ok(id)
      })
      .await?;

    debug!(id, "record added");
    Ok(id)
  }

  async fn list(&self) -> Result<Vec<Record>, StoreError> {
    let records = self
      .run(StoreError::Read, |conn| {
        let tx = conn.transaction().map_err(read_err)?;
        let records = {
          let mut stmt = tx
            .prepare("SELECT id, name, age FROM students ORDER BY id")
            .map_err(read_err)?;
          let rows = stmt
            .query_map([], |row| {
              Ok(Record {
                id: row.get(0)?,
                name: row.get(1)?,
                age: row.get(2)?,
              })
            })
            .map_err(read_err)?;
          rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(read_err)?
        };
        tx.commit().map_err(read_err)?;
        Ok(records)
      })
      .await?;

    debug!(count = records.len(), "records retrieved");
    Ok(records)
  }

  async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
    self
      .run(StoreError::Read, move |conn| {
        conn
          .query_row(
            "SELECT id, name, age FROM students WHERE id = ?",
            params![id],
            |row| {
              Ok(Record {
                id: row.get(0)?,
                name: row.get(1)?,
                age: row.get(2)?,
              })
            },
          )
          .optional()
          .map_err(read_err)
      })
      .await
  }

  async fn update(&self, record: Record) -> Result<(), StoreError> {
    let id = record.id;

    self
      .run(StoreError::Write, move |conn| {
        let tx = conn.transaction().map_err(write_err)?;
        let changed = tx
          .execute(
            "UPDATE students SET name = ?, age = ? WHERE id = ?",
            params![record.name, record.age, record.id],
          )
          .map_err(write_err)?;

        if changed == 0 {
          // Dropping the transaction rolls it back
          return Err(StoreError::NotFound(record.id));
        }

        tx.commit().map_err(write_err)?;
        Ok(())
      })
      .await?;

    debug!(id, "record updated");
    Ok(())
  }

  async fn delete(&self, id: RecordId) -> Result<(), StoreError> {
    self
      .run(StoreError::Write, move |conn| {
        let tx = conn.transaction().map_err(write_err)?;
        tx.execute("DELETE FROM students WHERE id = ?", params![id])
          .map_err(write_err)?;
        tx.commit().map_err(write_err)?;
        Ok(())
      })
      .await?;

    debug!(id, "record deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> SqliteRecordStore {
    SqliteRecordStore::open_in_memory().unwrap()
  }

  #[tokio::test]
  async fn test_add_assigns_fresh_ids() {
    let store = store();
    let first = store.add(NewRecord::new("Ana", 21)).await.unwrap();
    let second = store.add(NewRecord::new("Budi", 30)).await.unwrap();

    assert_eq!(first, 1);
    assert!(second > first);

    let records = store.list().await.unwrap();
    assert_eq!(
      records,
      vec![
        Record {
          id: first,
          name: "Ana".to_string(),
          age: 21
        },
        Record {
          id: second,
          name: "Budi".to_string(),
          age: 30
        },
      ]
    );
  }

  #[tokio::test]
  async fn test_update_replaces_fields_in_place() {
    let store = store();
    let id = store.add(NewRecord::new("Ana", 21)).await.unwrap();

    store
      .update(Record {
        id,
        name: "Ana Maria".to_string(),
        age: 22,
      })
      .await
      .unwrap();

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].name, "Ana Maria");
    assert_eq!(records[0].age, 22);
  }

  #[tokio::test]
  async fn test_update_missing_id_is_rejected() {
    let store = store();
    let result = store
      .update(Record {
        id: 42,
        name: "Ghost".to_string(),
        age: 40,
      })
      .await;

    assert_eq!(result, Err(StoreError::NotFound(42)));
    assert!(store.list().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_delete_is_idempotent() {
    let store = store();
    let id = store.add(NewRecord::new("Ana", 21)).await.unwrap();

    store.delete(id).await.unwrap();
    store.delete(id).await.unwrap();

    assert!(store.list().await.unwrap().iter().all(|r| r.id != id));
  }

  #[tokio::test]
  async fn test_deleted_id_is_never_reused() {
    let store = store();
    let first = store.add(NewRecord::new("Ana", 21)).await.unwrap();
    store.delete(first).await.unwrap();

    let second = store.add(NewRecord::new("Budi", 30)).await.unwrap();
    assert!(second > first);
  }

  #[tokio::test]
  async fn test_get_returns_none_for_missing_id() {
    let store = store();
    let id = store.add(NewRecord::new("Ana", 21)).await.unwrap();

    assert_eq!(store.get(id).await.unwrap().map(|r| r.name), Some("Ana".to_string()));
    assert_eq!(store.get(id + 1).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_reopen_keeps_records_and_counter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("StudentDB.sqlite");

    let removed = {
      let store = SqliteRecordStore::open(&path).await.unwrap();
      store.add(NewRecord::new("Ana", 21)).await.unwrap();
      let removed = store.add(NewRecord::new("Budi", 30)).await.unwrap();
      store.delete(removed).await.unwrap();
      removed
    };

    let store = SqliteRecordStore::open(&path).await.unwrap();
    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ana");

    let next = store.add(NewRecord::new("Citra", 19)).await.unwrap();
    assert!(next > removed);
  }

  #[tokio::test]
  async fn test_newer_schema_version_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite");
    {
      let conn = Connection::open(&path).unwrap();
      conn.execute_batch("PRAGMA user_version = 7;").unwrap();
    }

    let result = SqliteRecordStore::open(&path).await;
    assert!(matches!(result, Err(StoreError::Unavailable(_))));
  }
}
