//! Storage Module
//!
//! The persistence layer: a gateway that opens SQLite connections, and three
//! Stores that own the SQL for students, courses and enrollments.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌─────────────────┐
//! │ StudentStore │  │ CourseStore  │  │ EnrollmentStore │
//! └──────┬───────┘  └──────┬───────┘  └────────┬────────┘
//!        │   cascading     │   cascading       │
//!        │   deletes ──────┴──> remove_all_* ──┤
//!        ▼                 ▼                   ▼
//! ┌─────────────────────────────────────────────────────┐
//! │        Database (one connection per operation)      │
//! └─────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//!                        SQLite
//! ```
//!
//! ## Failure Model
//!
//! Each public Store method has a `try_*` twin returning
//! `Result<_, StoreError>`. The public method logs any error and answers with
//! `false`, `None` or an empty list, so a failing query never takes down the
//! session that issued it.
//!
//! ## Example
//!
//! ```no_run
//! use enrolld::storage::{schema, Database, Student, StudentStore};
//!
//! let db = Database::new("enrollment.db");
//! schema::bootstrap(&db, schema::DEFAULT_ADMIN_PASSWORD).unwrap();
//!
//! let students = StudentStore::new(db);
//! students.add(&Student::new("S1", "Alice", "pw"));
//! assert!(students.authenticate("S1", "pw").is_some());
//! ```

pub mod courses;
pub mod enrollments;
pub mod error;
pub mod gateway;
pub mod model;
pub mod schema;
pub mod students;

// Re-export commonly used types
pub use courses::CourseStore;
pub use enrollments::EnrollmentStore;
pub use error::{StoreError, StoreResult};
pub use gateway::Database;
pub use model::{Course, EnrollmentRecord, Student, ADMIN_STUDENT_NUMBER};
pub use students::StudentStore;

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tempfile::TempDir;

    /// A bootstrapped database in a temporary directory.
    ///
    /// The admin password is `adminpw`.
    pub(crate) struct TestDb {
        _dir: TempDir,
        db: Database,
    }

    impl TestDb {
        pub(crate) fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let db = Database::new(dir.path().join("test.db"));
            schema::bootstrap(&db, "adminpw").unwrap();
            Self { _dir: dir, db }
        }

        pub(crate) fn db(&self) -> &Database {
            &self.db
        }

        pub(crate) fn students(&self) -> StudentStore {
            StudentStore::new(self.db.clone())
        }

        pub(crate) fn courses(&self) -> CourseStore {
            CourseStore::new(self.db.clone())
        }

        pub(crate) fn enrollments(&self) -> EnrollmentStore {
            EnrollmentStore::new(self.db.clone())
        }

        /// Runs raw SQL, used to inject failures.
        pub(crate) fn execute(&self, sql: &str) {
            self.db.connect().unwrap().execute_batch(sql).unwrap();
        }
    }
}
