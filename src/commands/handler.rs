//! Command Handler
//!
//! Executes decoded requests against the three Stores and encodes the result
//! as exactly one reply value.
//!
//! ## Reply Shapes
//!
//! | Result            | Reply                               |
//! |-------------------|-------------------------------------|
//! | boolean           | `#t` / `#f`                         |
//! | optional record   | record array or `$-1`               |
//! | list of records   | array of record arrays              |
//! | count             | integer                             |
//! | unknown / invalid | `$-1`                               |
//!
//! Every Store call blocks on SQLite, so callers on the async runtime run
//! `dispatch` on the blocking pool.

use crate::commands::request::Request;
use crate::protocol::RespValue;
use crate::storage::{CourseStore, Database, EnrollmentStore, StudentStore, ADMIN_STUDENT_NUMBER};
use tracing::{debug, info, warn};

/// Dispatches requests to the Stores.
///
/// Cloning is cheap; each session gets its own clone.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    students: StudentStore,
    courses: CourseStore,
    enrollments: EnrollmentStore,
}

impl CommandHandler {
    /// Creates a command handler whose Stores share the given database.
    pub fn new(db: Database) -> Self {
        Self {
            students: StudentStore::new(db.clone()),
            courses: CourseStore::new(db.clone()),
            enrollments: EnrollmentStore::new(db),
        }
    }

    /// Decodes a request frame and executes it.
    ///
    /// Frames that fail to decode are answered with null. `EXIT` is also
    /// answered with null here; closing the connection is the session's job.
    pub fn execute(&self, frame: RespValue) -> RespValue {
        match Request::parse(frame) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                warn!(error = %e, "Rejected malformed request");
                RespValue::null()
            }
        }
    }

    /// Executes one request.
    pub fn dispatch(&self, request: Request) -> RespValue {
        match request {
            Request::Authenticate {
                student_number,
                password,
            } => {
                let student = self.students.authenticate(&student_number, &password);
                if student.is_some() {
                    info!(student = %student_number, "Authentication succeeded");
                } else {
                    info!(student = %student_number, "Authentication failed");
                }
                student.into()
            }
            Request::AddStudent(student) => self.students.add(&student).into(),
            Request::GetAllStudents => self.students.get_all().into(),
            Request::AddCourse(course) => self.courses.add(&course).into(),
            Request::GetCourses => self.courses.get_all().into(),
            Request::EnrollStudent {
                student_number,
                course_code,
            } => self.enrollments.enroll(&student_number, &course_code).into(),
            Request::GetStudentCourses { student_number } => self
                .enrollments
                .get_student_courses(&student_number)
                .into(),
            Request::GetCourseStudents { course_code } => {
                self.enrollments.get_course_students(&course_code).into()
            }
            Request::DeleteStudent { student_number } => {
                if student_number == ADMIN_STUDENT_NUMBER {
                    warn!("Refusing to delete the admin account");
                    return RespValue::boolean(false);
                }
                self.students.delete(&student_number).into()
            }
            Request::DeleteCourse { course_code } => self.courses.delete(&course_code).into(),
            Request::GetAllEnrollments => self.enrollments.get_all_enrollments().into(),
            Request::GetCourse { course_code } => self.courses.get_by_code(&course_code).into(),
            Request::UpdateCourse(course) => self.courses.update(&course).into(),
            Request::CourseExists { course_code } => self.courses.exists(&course_code).into(),
            Request::CountCourses => RespValue::integer(self.courses.count()),
            Request::SearchCourses { term } => self.courses.search_by_title(&term).into(),
            Request::UnenrollStudent {
                student_number,
                course_code,
            } => self
                .enrollments
                .unenroll(&student_number, &course_code)
                .into(),
            Request::IsEnrolled {
                student_number,
                course_code,
            } => self
                .enrollments
                .is_enrolled(&student_number, &course_code)
                .into(),
            Request::CountStudentEnrollments { student_number } => {
                RespValue::integer(self.enrollments.count_for_student(&student_number))
            }
            Request::CountCourseEnrollments { course_code } => {
                RespValue::integer(self.enrollments.count_for_course(&course_code))
            }
            Request::Ping => RespValue::pong(),
            Request::Exit => RespValue::null(),
            Request::Unknown(name) => {
                debug!(command = %name, "Unknown command");
                RespValue::null()
            }
        }
    }
}
