//! Course Store
//!
//! Operations over the `courses` table. Listings are ordered by course code.

use crate::storage::enrollments::EnrollmentStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::gateway::{recover, Database};
use crate::storage::model::Course;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

const COURSE_COLUMNS: &str = "course_code, title, description";

/// Data access for courses.
#[derive(Debug, Clone)]
pub struct CourseStore {
    db: Database,
}

impl CourseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a new course. Returns `false` if the code is already taken.
    pub fn add(&self, course: &Course) -> bool {
        recover("add_course", self.try_add(course), false)
    }

    pub fn get_by_code(&self, course_code: &str) -> Option<Course> {
        recover("get_course", self.try_get_by_code(course_code), None)
    }

    /// Returns every course ordered by code.
    pub fn get_all(&self) -> Vec<Course> {
        recover("get_all_courses", self.try_get_all(), Vec::new())
    }

    /// Updates title and description. The code itself never changes.
    pub fn update(&self, course: &Course) -> bool {
        recover("update_course", self.try_update(course), false)
    }

    pub fn exists(&self, course_code: &str) -> bool {
        recover("course_exists", self.try_exists(course_code), false)
    }

    pub fn count(&self) -> i64 {
        recover("count_courses", self.try_count(), 0)
    }

    /// Courses whose title contains `term`, ignoring ASCII case.
    pub fn search_by_title(&self, term: &str) -> Vec<Course> {
        recover("search_courses", self.try_search_by_title(term), Vec::new())
    }

    /// Deletes a course together with all of its enrollments.
    ///
    /// Returns `false` with nothing removed when the course does not exist or
    /// the transaction fails.
    pub fn delete(&self, course_code: &str) -> bool {
        recover("delete_course", self.try_delete(course_code), false)
    }

    pub fn try_add(&self, course: &Course) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let result = conn.execute(
            "INSERT INTO courses (course_code, title, description) VALUES (?1, ?2, ?3)",
            params![course.course_code, course.title, course.description],
        );

        match result.map_err(StoreError::from) {
            Ok(rows) => Ok(rows > 0),
            Err(e) if e.is_constraint_violation() => {
                debug!(course = %course.course_code, "Course already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn try_get_by_code(&self, course_code: &str) -> StoreResult<Option<Course>> {
        let conn = self.db.connect()?;
        let course = conn
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_code = ?1"),
                params![course_code],
                Course::from_row,
            )
            .optional()?;
        Ok(course)
    }

    pub fn try_get_all(&self) -> StoreResult<Vec<Course>> {
        let conn = self.db.connect()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY course_code"))?;
        let courses = stmt
            .query_map([], Course::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    pub fn try_update(&self, course: &Course) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let rows = conn.execute(
            "UPDATE courses SET title = ?1, description = ?2 WHERE course_code = ?3",
            params![course.title, course.description, course.course_code],
        )?;
        Ok(rows > 0)
    }

    pub fn try_exists(&self, course_code: &str) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM courses WHERE course_code = ?1",
                params![course_code],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn try_count(&self) -> StoreResult<i64> {
        let conn = self.db.connect()?;
        let count = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn try_search_by_title(&self, term: &str) -> StoreResult<Vec<Course>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE title LIKE ?1 ESCAPE '\\' ORDER BY course_code"
        ))?;
        let pattern = format!("%{}%", escape_like(term));
        let courses = stmt
            .query_map(params![pattern], Course::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    pub fn try_delete(&self, course_code: &str) -> StoreResult<bool> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        let enrollments = EnrollmentStore::remove_all_for_course(&tx, course_code)?;
        let rows = tx.execute(
            "DELETE FROM courses WHERE course_code = ?1",
            params![course_code],
        )?;

        if rows == 0 {
            tx.rollback()?;
            debug!(course = %course_code, "Course not found, delete rolled back");
            return Ok(false);
        }

        tx.commit()?;
        info!(course = %course_code, enrollments, "Course deleted");
        Ok(true)
    }
}

/// Escapes `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::Student;
    use crate::storage::testing::TestDb;

    fn intro() -> Course {
        Course::new("CS101", "Intro", Some("desc".to_string()))
    }

    #[test]
    fn test_add_and_get() {
        let t = TestDb::new();
        let store = t.courses();

        assert!(store.add(&intro()));
        assert_eq!(store.get_by_code("CS101"), Some(intro()));
        assert!(store.get_by_code("CS999").is_none());
    }

    #[test]
    fn test_add_duplicate_code() {
        let t = TestDb::new();
        let store = t.courses();

        assert!(store.add(&intro()));
        assert!(!store.add(&Course::new("CS101", "Other", None)));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_optional_description() {
        let t = TestDb::new();
        let store = t.courses();
        store.add(&Course::new("MA201", "Linear Algebra", None));

        assert_eq!(store.get_by_code("MA201").unwrap().description, None);
    }

    #[test]
    fn test_get_all_is_ordered_by_code() {
        let t = TestDb::new();
        let store = t.courses();
        store.add(&Course::new("MA201", "Linear Algebra", None));
        store.add(&Course::new("CS102", "Data Structures", None));
        store.add(&intro());

        let codes: Vec<String> = store.get_all().into_iter().map(|c| c.course_code).collect();
        assert_eq!(codes, vec!["CS101", "CS102", "MA201"]);
    }

    #[test]
    fn test_update_changes_title_and_description() {
        let t = TestDb::new();
        let store = t.courses();
        store.add(&intro());

        let updated = Course::new("CS101", "Introduction to Programming", None);
        assert!(store.update(&updated));
        assert_eq!(store.get_by_code("CS101"), Some(updated));

        assert!(!store.update(&Course::new("CS999", "Nothing", None)));
    }

    #[test]
    fn test_exists_and_count() {
        let t = TestDb::new();
        let store = t.courses();

        assert!(!store.exists("CS101"));
        assert_eq!(store.count(), 0);

        store.add(&intro());
        assert!(store.exists("CS101"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_search_by_title() {
        let t = TestDb::new();
        let store = t.courses();
        store.add(&Course::new("CS101", "Intro to Programming", None));
        store.add(&Course::new("CS201", "Advanced PROGRAMMING", None));
        store.add(&Course::new("MA101", "Calculus", None));
        store.add(&Course::new("MA102", "100% Statistics", None));

        let codes: Vec<String> = store
            .search_by_title("programming")
            .into_iter()
            .map(|c| c.course_code)
            .collect();
        assert_eq!(codes, vec!["CS101", "CS201"]);

        let literal = store.search_by_title("0%");
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].course_code, "MA102");

        assert!(store.search_by_title("biology").is_empty());
    }

    #[test]
    fn test_delete_missing_course() {
        let t = TestDb::new();
        let store = t.courses();
        store.add(&intro());

        assert!(!store.delete("CS999"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_delete_removes_exactly_its_enrollments() {
        let t = TestDb::new();
        let students = t.students();
        let courses = t.courses();
        let enrollments = t.enrollments();

        courses.add(&intro());
        courses.add(&Course::new("CS102", "Data Structures", None));
        for n in ["S1", "S2", "S3"] {
            students.add(&Student::new(n, n, "pw"));
            enrollments.enroll(n, "CS101");
        }
        enrollments.enroll("S1", "CS102");

        assert!(courses.delete("CS101"));

        assert!(!courses.exists("CS101"));
        assert_eq!(enrollments.count_for_course("CS101"), 0);
        assert_eq!(enrollments.count_for_course("CS102"), 1);
        assert_eq!(enrollments.get_all_enrollments().len(), 1);
    }

    #[test]
    fn test_failed_delete_is_atomic() {
        let t = TestDb::new();
        let students = t.students();
        let courses = t.courses();
        let enrollments = t.enrollments();

        courses.add(&intro());
        for n in ["S1", "S2", "S3"] {
            students.add(&Student::new(n, n, "pw"));
            enrollments.enroll(n, "CS101");
        }

        t.execute(
            "CREATE TRIGGER block_course_delete BEFORE DELETE ON courses
             BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
        );

        assert!(matches!(courses.try_delete("CS101"), Err(StoreError::Database(_))));
        assert!(!courses.delete("CS101"));

        assert!(courses.exists("CS101"));
        assert_eq!(enrollments.count_for_course("CS101"), 3);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
