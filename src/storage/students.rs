//! Student Store
//!
//! Operations over the `students` table. Deleting a student removes its
//! enrollments in the same transaction.

use crate::storage::enrollments::EnrollmentStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::gateway::{recover, Database};
use crate::storage::model::{Student, ADMIN_STUDENT_NUMBER};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

/// Data access for students.
#[derive(Debug, Clone)]
pub struct StudentStore {
    db: Database,
}

impl StudentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a new student.
    ///
    /// Returns `false` if the student number is already taken.
    pub fn add(&self, student: &Student) -> bool {
        recover("add_student", self.try_add(student), false)
    }

    /// Returns the student whose number and password both match exactly.
    pub fn authenticate(&self, student_number: &str, password: &str) -> Option<Student> {
        recover(
            "authenticate",
            self.try_authenticate(student_number, password),
            None,
        )
    }

    /// Looks a student up by number.
    pub fn get(&self, student_number: &str) -> Option<Student> {
        recover("get_student", self.try_get(student_number), None)
    }

    /// Returns every student in storage order.
    pub fn get_all(&self) -> Vec<Student> {
        recover("get_all_students", self.try_get_all(), Vec::new())
    }

    /// Number of student rows, the admin account included.
    pub fn count(&self) -> i64 {
        recover("count_students", self.try_count(), 0)
    }

    /// Deletes a student together with all of its enrollments.
    ///
    /// Returns `false` when the student does not exist, when it is the admin
    /// account, or when the transaction fails. In every `false` case no row
    /// has been removed.
    pub fn delete(&self, student_number: &str) -> bool {
        recover("delete_student", self.try_delete(student_number), false)
    }

    pub fn try_add(&self, student: &Student) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let result = conn.execute(
            "INSERT INTO students (student_number, name, password) VALUES (?1, ?2, ?3)",
            params![student.student_number, student.name, student.password],
        );

        match result.map_err(StoreError::from) {
            Ok(rows) => Ok(rows > 0),
            Err(e) if e.is_constraint_violation() => {
                debug!(student = %student.student_number, "Student already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn try_authenticate(
        &self,
        student_number: &str,
        password: &str,
    ) -> StoreResult<Option<Student>> {
        let conn = self.db.connect()?;
        let student = conn
            .query_row(
                "SELECT student_number, name, password FROM students
                 WHERE student_number = ?1 AND password = ?2",
                params![student_number, password],
                Student::from_row,
            )
            .optional()?;
        Ok(student)
    }

    pub fn try_get(&self, student_number: &str) -> StoreResult<Option<Student>> {
        let conn = self.db.connect()?;
        let student = conn
            .query_row(
                "SELECT student_number, name, password FROM students WHERE student_number = ?1",
                params![student_number],
                Student::from_row,
            )
            .optional()?;
        Ok(student)
    }

    pub fn try_get_all(&self) -> StoreResult<Vec<Student>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare("SELECT student_number, name, password FROM students")?;
        let students = stmt
            .query_map([], Student::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    pub fn try_count(&self) -> StoreResult<i64> {
        let conn = self.db.connect()?;
        let count = conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn try_delete(&self, student_number: &str) -> StoreResult<bool> {
        if student_number == ADMIN_STUDENT_NUMBER {
            return Err(StoreError::ProtectedAccount(student_number.to_string()));
        }

        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        let enrollments = EnrollmentStore::remove_all_for_student(&tx, student_number)?;
        let rows = tx.execute(
            "DELETE FROM students WHERE student_number = ?1",
            params![student_number],
        )?;

        if rows == 0 {
            tx.rollback()?;
            debug!(student = %student_number, "Student not found, delete rolled back");
            return Ok(false);
        }

        tx.commit()?;
        info!(student = %student_number, enrollments, "Student deleted");
        Ok(true)
    }
}
