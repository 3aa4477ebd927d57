//! Row types for the three tables and the enrollment report.

use rusqlite::Row;

/// The reserved student number of the administrator account.
pub const ADMIN_STUDENT_NUMBER: &str = "admin";

/// A row of the `students` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub student_number: String,
    pub name: String,
    pub password: String,
}

impl Student {
    pub fn new(
        student_number: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            student_number: student_number.into(),
            name: name.into(),
            password: password.into(),
        }
    }

    /// Returns true for the administrator account.
    pub fn is_admin(&self) -> bool {
        self.student_number == ADMIN_STUDENT_NUMBER
    }

    /// Maps a `student_number, name, password` row.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            student_number: row.get(0)?,
            name: row.get(1)?,
            password: row.get(2)?,
        })
    }
}

/// A row of the `courses` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub course_code: String,
    pub title: String,
    pub description: Option<String>,
}

impl Course {
    pub fn new(
        course_code: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            course_code: course_code.into(),
            title: title.into(),
            description,
        }
    }

    /// Maps a `course_code, title, description` row.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            course_code: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
        })
    }
}

/// One line of the enrollment report: an enrollment joined with the names
/// of the student and the course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub student_number: String,
    pub student_name: String,
    pub course_code: String,
    pub course_title: String,
}

impl EnrollmentRecord {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            student_number: row.get(0)?,
            student_name: row.get(1)?,
            course_code: row.get(2)?,
            course_title: row.get(3)?,
        })
    }
}
