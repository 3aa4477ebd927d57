//! Enrollment Store
//!
//! Operations over the `enrollments` join table. A student/course pair is
//! enrolled at most once; the `UNIQUE (student_number, course_code)`
//! constraint enforces this, so `enroll` is a single insert whose constraint
//! violation means "already enrolled". Concurrent enrolls of the same pair
//! cannot both succeed.

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::gateway::{recover, Database};
use crate::storage::model::{Course, EnrollmentRecord, Student};
use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

/// Data access for enrollments.
#[derive(Debug, Clone)]
pub struct EnrollmentStore {
    db: Database,
}

impl EnrollmentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Enrolls a student in a course.
    ///
    /// Returns `false` without changing anything when the pair is already
    /// enrolled or when either side does not exist.
    pub fn enroll(&self, student_number: &str, course_code: &str) -> bool {
        recover("enroll", self.try_enroll(student_number, course_code), false)
    }

    pub fn is_enrolled(&self, student_number: &str, course_code: &str) -> bool {
        recover(
            "is_enrolled",
            self.try_is_enrolled(student_number, course_code),
            false,
        )
    }

    /// Courses the student is enrolled in, ordered by course code.
    pub fn get_student_courses(&self, student_number: &str) -> Vec<Course> {
        recover(
            "get_student_courses",
            self.try_get_student_courses(student_number),
            Vec::new(),
        )
    }

    /// Students enrolled in the course, ordered by student number.
    pub fn get_course_students(&self, course_code: &str) -> Vec<Student> {
        recover(
            "get_course_students",
            self.try_get_course_students(course_code),
            Vec::new(),
        )
    }

    /// Removes one enrollment. Returns whether a row was removed.
    pub fn unenroll(&self, student_number: &str, course_code: &str) -> bool {
        recover(
            "unenroll",
            self.try_unenroll(student_number, course_code),
            false,
        )
    }

    /// Every enrollment with student name and course title, ordered by
    /// student number then course code.
    pub fn get_all_enrollments(&self) -> Vec<EnrollmentRecord> {
        recover(
            "get_all_enrollments",
            self.try_get_all_enrollments(),
            Vec::new(),
        )
    }

    pub fn count_for_student(&self, student_number: &str) -> i64 {
        recover(
            "count_for_student",
            self.try_count("student_number", student_number),
            0,
        )
    }

    pub fn count_for_course(&self, course_code: &str) -> i64 {
        recover(
            "count_for_course",
            self.try_count("course_code", course_code),
            0,
        )
    }

    /// Deletes every enrollment of a student inside the caller's transaction.
    ///
    /// Returns the number of removed rows.
    pub fn remove_all_for_student(
        tx: &Transaction<'_>,
        student_number: &str,
    ) -> StoreResult<usize> {
        let rows = tx.execute(
            "DELETE FROM enrollments WHERE student_number = ?1",
            params![student_number],
        )?;
        Ok(rows)
    }

    /// Deletes every enrollment in a course inside the caller's transaction.
    ///
    /// Returns the number of removed rows.
    pub fn remove_all_for_course(tx: &Transaction<'_>, course_code: &str) -> StoreResult<usize> {
        let rows = tx.execute(
            "DELETE FROM enrollments WHERE course_code = ?1",
            params![course_code],
        )?;
        Ok(rows)
    }

    pub fn try_enroll(&self, student_number: &str, course_code: &str) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let result = conn.execute(
            "INSERT INTO enrollments (student_number, course_code) VALUES (?1, ?2)",
            params![student_number, course_code],
        );

        match result.map_err(StoreError::from) {
            Ok(rows) => Ok(rows > 0),
            Err(e) if e.is_constraint_violation() => {
                debug!(
                    student = %student_number,
                    course = %course_code,
                    "Enrollment rejected by constraint"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn try_is_enrolled(&self, student_number: &str, course_code: &str) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM enrollments WHERE student_number = ?1 AND course_code = ?2",
                params![student_number, course_code],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn try_get_student_courses(&self, student_number: &str) -> StoreResult<Vec<Course>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(
            "SELECT c.course_code, c.title, c.description
             FROM courses c
             JOIN enrollments e ON c.course_code = e.course_code
             WHERE e.student_number = ?1
             ORDER BY c.course_code",
        )?;
        let courses = stmt
            .query_map(params![student_number], Course::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    pub fn try_get_course_students(&self, course_code: &str) -> StoreResult<Vec<Student>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(
            "SELECT s.student_number, s.name, s.password
             FROM students s
             JOIN enrollments e ON s.student_number = e.student_number
             WHERE e.course_code = ?1
             ORDER BY s.student_number",
        )?;
        let students = stmt
            .query_map(params![course_code], Student::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    pub fn try_unenroll(&self, student_number: &str, course_code: &str) -> StoreResult<bool> {
        let conn = self.db.connect()?;
        let rows = conn.execute(
            "DELETE FROM enrollments WHERE student_number = ?1 AND course_code = ?2",
            params![student_number, course_code],
        )?;
        Ok(rows > 0)
    }

    pub fn try_get_all_enrollments(&self) -> StoreResult<Vec<EnrollmentRecord>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(
            "SELECT e.student_number, s.name, e.course_code, c.title
             FROM enrollments e
             JOIN students s ON e.student_number = s.student_number
             JOIN courses c ON e.course_code = c.course_code
             ORDER BY e.student_number, e.course_code",
        )?;
        let records = stmt
            .query_map([], EnrollmentRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Counts rows matching one foreign-key column. `column` is always a
    /// literal from this module, never client input.
    fn try_count(&self, column: &'static str, key: &str) -> StoreResult<i64> {
        let conn = self.db.connect()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM enrollments WHERE {column} = ?1"),
            params![key],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::TestDb;

    fn seeded() -> TestDb {
        let t = TestDb::new();
        let students = t.students();
        let courses = t.courses();
        students.add(&Student::new("S1", "Alice", "pw"));
        students.add(&Student::new("S2", "Bob", "pw"));
        courses.add(&Course::new("CS101", "Intro", Some("desc".to_string())));
        courses.add(&Course::new("CS102", "Data Structures", None));
        t
    }

    fn pair_rows(t: &TestDb, student: &str, course: &str) -> i64 {
        t.db()
            .connect()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM enrollments WHERE student_number = ?1 AND course_code = ?2",
                params![student, course],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_enroll_and_is_enrolled() {
        let t = seeded();
        let store = t.enrollments();

        assert!(!store.is_enrolled("S1", "CS101"));
        assert!(store.enroll("S1", "CS101"));
        assert!(store.is_enrolled("S1", "CS101"));
        assert!(!store.is_enrolled("S2", "CS101"));
    }

    #[test]
    fn test_duplicate_enroll_is_rejected() {
        let t = seeded();
        let store = t.enrollments();

        assert!(store.enroll("S1", "CS101"));
        assert!(!store.enroll("S1", "CS101"));
        assert_eq!(pair_rows(&t, "S1", "CS101"), 1);
    }

    #[test]
    fn test_enroll_unknown_student_or_course() {
        let t = seeded();
        let store = t.enrollments();

        assert!(!store.enroll("ghost", "CS101"));
        assert!(!store.enroll("S1", "CS999"));
        assert!(store.get_all_enrollments().is_empty());
    }

    #[test]
    fn test_concurrent_enrolls_insert_once() {
        let t = seeded();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = t.enrollments();
                std::thread::spawn(move || store.enroll("S1", "CS101"))
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(pair_rows(&t, "S1", "CS101"), 1);
    }

    #[test]
    fn test_student_courses_ordered_by_code() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S1", "CS102");
        store.enroll("S1", "CS101");

        let codes: Vec<String> = store
            .get_student_courses("S1")
            .into_iter()
            .map(|c| c.course_code)
            .collect();
        assert_eq!(codes, vec!["CS101", "CS102"]);
        assert!(store.get_student_courses("S2").is_empty());
    }

    #[test]
    fn test_course_students_ordered_by_number() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S2", "CS101");
        store.enroll("S1", "CS101");

        let numbers: Vec<String> = store
            .get_course_students("CS101")
            .into_iter()
            .map(|s| s.student_number)
            .collect();
        assert_eq!(numbers, vec!["S1", "S2"]);
    }

    #[test]
    fn test_student_and_course_views_agree() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S1", "CS101");
        store.enroll("S1", "CS102");
        store.enroll("S2", "CS102");

        for student in ["S1", "S2"] {
            for course in store.get_student_courses(student) {
                assert!(store
                    .get_course_students(&course.course_code)
                    .iter()
                    .any(|s| s.student_number == student));
            }
        }
    }

    #[test]
    fn test_unenroll() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S1", "CS101");

        assert!(store.unenroll("S1", "CS101"));
        assert!(!store.is_enrolled("S1", "CS101"));
        assert!(!store.unenroll("S1", "CS101"));
    }

    #[test]
    fn test_counts() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S1", "CS101");
        store.enroll("S1", "CS102");
        store.enroll("S2", "CS101");

        assert_eq!(store.count_for_student("S1"), 2);
        assert_eq!(store.count_for_student("S2"), 1);
        assert_eq!(store.count_for_course("CS101"), 2);
        assert_eq!(store.count_for_course("CS999"), 0);
    }

    #[test]
    fn test_all_enrollments_report() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S2", "CS101");
        store.enroll("S1", "CS102");
        store.enroll("S1", "CS101");

        let report = store.get_all_enrollments();
        let keys: Vec<(&str, &str)> = report
            .iter()
            .map(|r| (r.student_number.as_str(), r.course_code.as_str()))
            .collect();
        assert_eq!(keys, vec![("S1", "CS101"), ("S1", "CS102"), ("S2", "CS101")]);
        assert_eq!(report[0].student_name, "Alice");
        assert_eq!(report[1].course_title, "Data Structures");
    }

    #[test]
    fn test_remove_all_rolls_back_with_transaction() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S1", "CS101");
        store.enroll("S1", "CS102");

        let mut conn = t.db().connect().unwrap();
        let tx = conn.transaction().unwrap();
        assert_eq!(EnrollmentStore::remove_all_for_student(&tx, "S1").unwrap(), 2);
        tx.rollback().unwrap();

        assert_eq!(store.count_for_student("S1"), 2);
    }

    #[test]
    fn test_remove_all_for_course_commits_with_transaction() {
        let t = seeded();
        let store = t.enrollments();
        store.enroll("S1", "CS101");
        store.enroll("S2", "CS101");
        store.enroll("S2", "CS102");

        let mut conn = t.db().connect().unwrap();
        let tx = conn.transaction().unwrap();
        assert_eq!(EnrollmentStore::remove_all_for_course(&tx, "CS101").unwrap(), 2);
        tx.commit().unwrap();

        assert_eq!(store.count_for_course("CS101"), 0);
        assert_eq!(store.count_for_course("CS102"), 1);
    }
}
