//! Cache generation storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

use super::request::{AssetRequest, AssetResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cache storage error: {0}")]
pub struct CacheError(pub String);

/// A response found in some generation.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub response: AssetResponse,
  /// Generation the entry was found in
  pub generation: String,
  /// When the entry was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache generation backends.
///
/// A generation is a named bag of request → response entries. Each call is
/// atomic on its own.
pub trait CacheStorage: Send + Sync + 'static {
  /// Create the generation if absent. Returns true when it was created.
  fn open(&self, name: &str) -> Result<bool, CacheError>;

  /// Generation names in creation order.
  fn keys(&self) -> Result<Vec<String>, CacheError>;

  /// Delete a generation and all of its entries. Returns true if it existed.
  fn delete(&self, name: &str) -> Result<bool, CacheError>;

  /// Store one entry, creating the generation if needed.
  fn put(&self, name: &str, request: &AssetRequest, response: &AssetResponse)
    -> Result<(), CacheError>;

  /// Store several entries in one transaction; either all land or none do.
  fn put_all(&self, name: &str, entries: &[(AssetRequest, AssetResponse)])
    -> Result<(), CacheError>;

  /// Look a request up in every generation, oldest first.
  fn match_any(&self, request: &AssetRequest) -> Result<Option<CachedResponse>, CacheError>;

  /// URLs stored in a generation.
  fn entries(&self, name: &str) -> Result<Vec<String>, CacheError>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteCacheStorage {
  conn: Mutex<Connection>,
}

impl SqliteCacheStorage {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self, CacheError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| CacheError(format!("Failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      CacheError(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::with_connection(conn)
  }

  pub fn open_in_memory() -> Result<Self, CacheError> {
    let conn = Connection::open_in_memory()
      .map_err(|e| CacheError(format!("Failed to open in-memory cache: {}", e)))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self, CacheError> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| CacheError(format!("Failed to run cache migrations: {}", e)))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
    self
      .conn
      .lock()
      .map_err(|e| CacheError(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One row per generation; rowid gives creation order
CREATE TABLE IF NOT EXISTS cache_generations (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cache_entries (
    generation TEXT NOT NULL,
    request_key TEXT NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, request_key)
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_key ON cache_entries(request_key);
"#;

fn insert_entry(
  conn: &Connection,
  name: &str,
  request: &AssetRequest,
  response: &AssetResponse,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO cache_generations (name) VALUES (?)",
    params![name],
  )?;
  conn.execute(
    "INSERT OR REPLACE INTO cache_entries
       (generation, request_key, method, url, status, content_type, body, cached_at)
     VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))",
    params![
      name,
      request.cache_key(),
      request.method,
      request.url.as_str(),
      response.status,
      response.content_type,
      response.body,
    ],
  )?;
  Ok(())
}

fn row_to_cached(row: &rusqlite::Row<'_>) -> rusqlite::Result<(AssetResponse, String, String)> {
  Ok((
    AssetResponse {
      status: row.get(0)?,
      content_type: row.get(1)?,
      body: row.get(2)?,
    },
    row.get(3)?,
    row.get(4)?,
  ))
}

fn into_cached(found: Option<(AssetResponse, String, String)>) -> Result<Option<CachedResponse>, CacheError> {
  match found {
    Some((response, generation, cached_at)) => Ok(Some(CachedResponse {
      response,
      generation,
      cached_at: parse_datetime(&cached_at)?,
    })),
    None => Ok(None),
  }
}

impl CacheStorage for SqliteCacheStorage {
  fn open(&self, name: &str) -> Result<bool, CacheError> {
    let conn = self.lock()?;
    let inserted = conn
      .execute(
        "INSERT OR IGNORE INTO cache_generations (name) VALUES (?)",
        params![name],
      )
      .map_err(|e| CacheError(format!("Failed to open generation {}: {}", name, e)))?;
    Ok(inserted > 0)
  }

  fn keys(&self) -> Result<Vec<String>, CacheError> {
    let conn = self.lock()?;
    let mut stmt = conn
      .prepare("SELECT name FROM cache_generations ORDER BY rowid")
      .map_err(|e| CacheError(format!("Failed to prepare query: {}", e)))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| CacheError(format!("Failed to list generations: {}", e)))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| CacheError(format!("Failed to list generations: {}", e)))?;

    Ok(names)
  }

  fn delete(&self, name: &str) -> Result<bool, CacheError> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| CacheError(format!("Failed to begin transaction: {}", e)))?;

    tx.execute(
      "DELETE FROM cache_entries WHERE generation = ?",
      params![name],
    )
    .map_err(|e| CacheError(format!("Failed to delete entries of {}: {}", name, e)))?;
    let removed = tx
      .execute(
        "DELETE FROM cache_generations WHERE name = ?",
        params![name],
      )
      .map_err(|e| CacheError(format!("Failed to delete generation {}: {}", name, e)))?;

    tx.commit()
      .map_err(|e| CacheError(format!("Failed to commit transaction: {}", e)))?;

    Ok(removed > 0)
  }

  fn put(
    &self,
    name: &str,
    request: &AssetRequest,
    response: &AssetResponse,
  ) -> Result<(), CacheError> {
    let conn = self.lock()?;
    insert_entry(&conn, name, request, response)
      .map_err(|e| CacheError(format!("Failed to store {}: {}", request.url, e)))
  }

  fn put_all(
    &self,
    name: &str,
    entries: &[(AssetRequest, AssetResponse)],
  ) -> Result<(), CacheError> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| CacheError(format!("Failed to begin transaction: {}", e)))?;

    for (request, response) in entries {
      insert_entry(&tx, name, request, response)
        .map_err(|e| CacheError(format!("Failed to store {}: {}", request.url, e)))?;
    }

    tx.commit()
      .map_err(|e| CacheError(format!("Failed to commit transaction: {}", e)))?;

    Ok(())
  }

  fn match_any(&self, request: &AssetRequest) -> Result<Option<CachedResponse>, CacheError> {
    let conn = self.lock()?;
    let found = conn
      .query_row(
        "SELECT e.status, e.content_type, e.body, e.generation, e.cached_at
         FROM cache_entries e
         INNER JOIN cache_generations g ON g.name = e.generation
         WHERE e.request_key = ?
         ORDER BY g.rowid
         LIMIT 1",
        params![request.cache_key()],
        row_to_cached,
      )
      .optional()
      .map_err(|e| CacheError(format!("Failed to query cache: {}", e)))?;

    into_cached(found)
  }

  fn entries(&self, name: &str) -> Result<Vec<String>, CacheError> {
    let conn = self.lock()?;
    let mut stmt = conn
      .prepare("SELECT url FROM cache_entries WHERE generation = ? ORDER BY url")
      .map_err(|e| CacheError(format!("Failed to prepare query: {}", e)))?;

    let urls = stmt
      .query_map(params![name], |row| row.get(0))
      .map_err(|e| CacheError(format!("Failed to list entries: {}", e)))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| CacheError(format!("Failed to list entries: {}", e)))?;

    Ok(urls)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| CacheError(format!("Failed to parse datetime '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(path: &str) -> AssetRequest {
    AssetRequest::parse(&format!("http://localhost:8080{}", path)).unwrap()
  }

  fn body(text: &str) -> AssetResponse {
    AssetResponse::new(200, Some("text/plain"), text.as_bytes().to_vec())
  }

  #[test]
  fn test_open_reports_creation() {
    let storage = SqliteCacheStorage::open_in_memory().unwrap();
    assert!(storage.open("v1").unwrap());
    assert!(!storage.open("v1").unwrap());
    assert_eq!(storage.keys().unwrap(), vec!["v1".to_string()]);
  }

  #[test]
  fn test_put_and_match() {
    let storage = SqliteCacheStorage::open_in_memory().unwrap();
    storage.put("v1", &request("/a.css"), &body("a")).unwrap();

    let hit = storage.match_any(&request("/a.css")).unwrap().unwrap();
    assert_eq!(hit.response, body("a"));
    assert_eq!(hit.generation, "v1");
    assert!(storage.match_any(&request("/b.css")).unwrap().is_none());
  }

  #[test]
  fn test_match_any_prefers_oldest_generation() {
    let storage = SqliteCacheStorage::open_in_memory().unwrap();
    storage.put("v1", &request("/a.css"), &body("old")).unwrap();
    storage.put("v2", &request("/a.css"), &body("new")).unwrap();

    let hit = storage.match_any(&request("/a.css")).unwrap().unwrap();
    assert_eq!(hit.generation, "v1");

    storage.delete("v1").unwrap();
    let hit = storage.match_any(&request("/a.css")).unwrap().unwrap();
    assert_eq!(hit.response, body("new"));
  }

  #[test]
  fn test_delete_removes_entries() {
    let storage = SqliteCacheStorage::open_in_memory().unwrap();
    storage
      .put_all(
        "v1",
        &[(request("/a.css"), body("a")), (request("/b.js"), body("b"))],
      )
      .unwrap();
    assert_eq!(storage.entries("v1").unwrap().len(), 2);

    assert!(storage.delete("v1").unwrap());
    assert!(!storage.delete("v1").unwrap());
    assert!(storage.keys().unwrap().is_empty());
    assert!(storage.entries("v1").unwrap().is_empty());
    assert!(storage.match_any(&request("/a.css")).unwrap().is_none());

    // Entries are removed explicitly, not by a foreign key cascade
    let orphans: i64 = storage
      .lock()
      .unwrap()
      .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
      .unwrap();
    assert_eq!(orphans, 0);
  }
}
