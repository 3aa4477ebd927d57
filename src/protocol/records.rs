//! Record Encoding
//!
//! Domain records travel as fixed-shape arrays:
//!
//! ```text
//! Student          *3  number, name, password
//! Course           *3  code, title, description | $-1
//! EnrollmentRecord *4  student number, student name, course code, course title
//! ```

use crate::protocol::types::RespValue;
use crate::storage::{Course, EnrollmentRecord, Student};

impl From<Student> for RespValue {
    fn from(s: Student) -> Self {
        RespValue::Array(vec![
            s.student_number.into(),
            s.name.into(),
            s.password.into(),
        ])
    }
}

impl From<Course> for RespValue {
    fn from(c: Course) -> Self {
        RespValue::Array(vec![
            c.course_code.into(),
            c.title.into(),
            c.description.into(),
        ])
    }
}

impl From<EnrollmentRecord> for RespValue {
    fn from(r: EnrollmentRecord) -> Self {
        RespValue::Array(vec![
            r.student_number.into(),
            r.student_name.into(),
            r.course_code.into(),
            r.course_title.into(),
        ])
    }
}

/// Extracts exactly `N` fields from a record array.
fn fields<const N: usize>(value: &RespValue) -> Option<&[RespValue; N]> {
    value.as_array()?.try_into().ok()
}

fn text(value: &RespValue) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl Student {
    /// Decodes a `[number, name, password]` record.
    pub fn from_resp(value: &RespValue) -> Option<Self> {
        let [number, name, password] = fields::<3>(value)?;
        Some(Student::new(text(number)?, text(name)?, text(password)?))
    }
}

impl Course {
    /// Decodes a `[code, title, description | null]` record.
    pub fn from_resp(value: &RespValue) -> Option<Self> {
        let [code, title, description] = fields::<3>(value)?;
        let description = match description {
            RespValue::Null => None,
            other => Some(text(other)?),
        };
        Some(Course::new(text(code)?, text(title)?, description))
    }
}

impl EnrollmentRecord {
    /// Decodes a four-field report line.
    pub fn from_resp(value: &RespValue) -> Option<Self> {
        let [student_number, student_name, course_code, course_title] = fields::<4>(value)?;
        Some(EnrollmentRecord {
            student_number: text(student_number)?,
            student_name: text(student_name)?,
            course_code: text(course_code)?,
            course_title: text(course_title)?,
        })
    }
}
