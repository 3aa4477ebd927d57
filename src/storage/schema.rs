//! Schema bootstrap.
//!
//! Creates the three tables and seeds the administrator account. Safe to run
//! on every start: existing tables and the existing admin row are left alone.

use crate::storage::error::StoreResult;
use crate::storage::gateway::Database;
use crate::storage::model::ADMIN_STUDENT_NUMBER;
use rusqlite::params;
use tracing::info;

/// Password seeded for the administrator account unless overridden.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS students (
    student_number TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    password       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    course_code TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS enrollments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    student_number TEXT NOT NULL REFERENCES students(student_number),
    course_code    TEXT NOT NULL REFERENCES courses(course_code),
    UNIQUE (student_number, course_code)
);

CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_code);
";

/// Creates the tables if missing and seeds the admin row.
pub fn bootstrap(db: &Database, admin_password: &str) -> StoreResult<()> {
    let conn = db.connect()?;
    conn.execute_batch(SCHEMA)?;

    let seeded = conn.execute(
        "INSERT OR IGNORE INTO students (student_number, name, password) VALUES (?1, ?2, ?3)",
        params![ADMIN_STUDENT_NUMBER, "Administrator", admin_password],
    )?;

    info!(
        path = %db.path().display(),
        admin_seeded = seeded > 0,
        "Database schema ready"
    );
    Ok(())
}
