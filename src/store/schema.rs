/// Schema version stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// Initial schema, applied only when the database is brand new.
///
/// AUTOINCREMENT keeps ids strictly ascending and never reuses a deleted one.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_students_name ON students(name);
CREATE INDEX IF NOT EXISTS idx_students_age ON students(age);

PRAGMA user_version = 1;
"#;
