//! Typed Requests
//!
//! Turns a request frame into a [`Request`]. Each known command has a fixed
//! argument list; a frame with the wrong number or shape of arguments is a
//! [`RequestError`], and a command name nobody knows becomes
//! [`Request::Unknown`].

use crate::protocol::RespValue;
use crate::storage::{Course, Student};
use thiserror::Error;

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Authenticate {
        student_number: String,
        password: String,
    },
    AddStudent(Student),
    GetAllStudents,
    AddCourse(Course),
    GetCourses,
    EnrollStudent {
        student_number: String,
        course_code: String,
    },
    GetStudentCourses {
        student_number: String,
    },
    GetCourseStudents {
        course_code: String,
    },
    DeleteStudent {
        student_number: String,
    },
    DeleteCourse {
        course_code: String,
    },
    GetAllEnrollments,
    GetCourse {
        course_code: String,
    },
    UpdateCourse(Course),
    CourseExists {
        course_code: String,
    },
    CountCourses,
    SearchCourses {
        term: String,
    },
    UnenrollStudent {
        student_number: String,
        course_code: String,
    },
    IsEnrolled {
        student_number: String,
        course_code: String,
    },
    CountStudentEnrollments {
        student_number: String,
    },
    CountCourseEnrollments {
        course_code: String,
    },
    Ping,
    /// Ends the session. Never answered.
    Exit,
    /// A command name that is not part of the protocol.
    Unknown(String),
}

/// Errors raised while decoding a request frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request must be an array")]
    NotAnArray,

    #[error("empty request")]
    Empty,

    #[error("command name must be a string")]
    InvalidName,

    #[error("wrong number of arguments for '{command}': expected {expected}, got {got}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument {index} for '{command}'")]
    InvalidArgument { command: &'static str, index: usize },
}

impl Request {
    /// Decodes a request frame.
    pub fn parse(frame: RespValue) -> Result<Self, RequestError> {
        let items = frame.into_array().ok_or(RequestError::NotAnArray)?;
        let (name, args) = items.split_first().ok_or(RequestError::Empty)?;
        let name = name.as_str().ok_or(RequestError::InvalidName)?.to_uppercase();

        let request = match name.as_str() {
            "AUTHENTICATE" => {
                let [student_number, password] = strings("AUTHENTICATE", args)?;
                Request::Authenticate {
                    student_number,
                    password,
                }
            }
            "ADD_STUDENT" => {
                let [record] = exact::<1>("ADD_STUDENT", args)?;
                Request::AddStudent(Student::from_resp(record).ok_or(
                    RequestError::InvalidArgument {
                        command: "ADD_STUDENT",
                        index: 0,
                    },
                )?)
            }
            "GET_ALL_STUDENTS" => {
                exact::<0>("GET_ALL_STUDENTS", args)?;
                Request::GetAllStudents
            }
            "ADD_COURSE" => Request::AddCourse(course("ADD_COURSE", args)?),
            "GET_COURSES" => {
                exact::<0>("GET_COURSES", args)?;
                Request::GetCourses
            }
            "ENROLL_STUDENT" => {
                let [student_number, course_code] = strings("ENROLL_STUDENT", args)?;
                Request::EnrollStudent {
                    student_number,
                    course_code,
                }
            }
            "GET_STUDENT_COURSES" => {
                let [student_number] = strings("GET_STUDENT_COURSES", args)?;
                Request::GetStudentCourses { student_number }
            }
            "GET_COURSE_STUDENTS" => {
                let [course_code] = strings("GET_COURSE_STUDENTS", args)?;
                Request::GetCourseStudents { course_code }
            }
            "DELETE_STUDENT" => {
                let [student_number] = strings("DELETE_STUDENT", args)?;
                Request::DeleteStudent { student_number }
            }
            "DELETE_COURSE" => {
                let [course_code] = strings("DELETE_COURSE", args)?;
                Request::DeleteCourse { course_code }
            }
            "GET_ALL_ENROLLMENTS" => {
                exact::<0>("GET_ALL_ENROLLMENTS", args)?;
                Request::GetAllEnrollments
            }
            "GET_COURSE" => {
                let [course_code] = strings("GET_COURSE", args)?;
                Request::GetCourse { course_code }
            }
            "UPDATE_COURSE" => Request::UpdateCourse(course("UPDATE_COURSE", args)?),
            "COURSE_EXISTS" => {
                let [course_code] = strings("COURSE_EXISTS", args)?;
                Request::CourseExists { course_code }
            }
            "COUNT_COURSES" => {
                exact::<0>("COUNT_COURSES", args)?;
                Request::CountCourses
            }
            "SEARCH_COURSES" => {
                let [term] = strings("SEARCH_COURSES", args)?;
                Request::SearchCourses { term }
            }
            "UNENROLL_STUDENT" => {
                let [student_number, course_code] = strings("UNENROLL_STUDENT", args)?;
                Request::UnenrollStudent {
                    student_number,
                    course_code,
                }
            }
            "IS_ENROLLED" => {
                let [student_number, course_code] = strings("IS_ENROLLED", args)?;
                Request::IsEnrolled {
                    student_number,
                    course_code,
                }
            }
            "COUNT_STUDENT_ENROLLMENTS" => {
                let [student_number] = strings("COUNT_STUDENT_ENROLLMENTS", args)?;
                Request::CountStudentEnrollments { student_number }
            }
            "COUNT_COURSE_ENROLLMENTS" => {
                let [course_code] = strings("COUNT_COURSE_ENROLLMENTS", args)?;
                Request::CountCourseEnrollments { course_code }
            }
            // PING and EXIT ignore trailing arguments
            "PING" => Request::Ping,
            "EXIT" => Request::Exit,
            _ => Request::Unknown(name),
        };

        Ok(request)
    }

    /// The command name, for logging.
    pub fn name(&self) -> &str {
        match self {
            Request::Authenticate { .. } => "AUTHENTICATE",
            Request::AddStudent(_) => "ADD_STUDENT",
            Request::GetAllStudents => "GET_ALL_STUDENTS",
            Request::AddCourse(_) => "ADD_COURSE",
            Request::GetCourses => "GET_COURSES",
            Request::EnrollStudent { .. } => "ENROLL_STUDENT",
            Request::GetStudentCourses { .. } => "GET_STUDENT_COURSES",
            Request::GetCourseStudents { .. } => "GET_COURSE_STUDENTS",
            Request::DeleteStudent { .. } => "DELETE_STUDENT",
            Request::DeleteCourse { .. } => "DELETE_COURSE",
            Request::GetAllEnrollments => "GET_ALL_ENROLLMENTS",
            Request::GetCourse { .. } => "GET_COURSE",
            Request::UpdateCourse(_) => "UPDATE_COURSE",
            Request::CourseExists { .. } => "COURSE_EXISTS",
            Request::CountCourses => "COUNT_COURSES",
            Request::SearchCourses { .. } => "SEARCH_COURSES",
            Request::UnenrollStudent { .. } => "UNENROLL_STUDENT",
            Request::IsEnrolled { .. } => "IS_ENROLLED",
            Request::CountStudentEnrollments { .. } => "COUNT_STUDENT_ENROLLMENTS",
            Request::CountCourseEnrollments { .. } => "COUNT_COURSE_ENROLLMENTS",
            Request::Ping => "PING",
            Request::Exit => "EXIT",
            Request::Unknown(name) => name,
        }
    }
}

/// Checks the argument count.
fn exact<'a, const N: usize>(
    command: &'static str,
    args: &'a [RespValue],
) -> Result<&'a [RespValue; N], RequestError> {
    args.try_into().map_err(|_| RequestError::WrongArity {
        command,
        expected: N,
        got: args.len(),
    })
}

/// Checks the argument count and reads every argument as a string.
fn strings<const N: usize>(
    command: &'static str,
    args: &[RespValue],
) -> Result<[String; N], RequestError> {
    let args = exact::<N>(command, args)?;
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (index, (slot, arg)) in out.iter_mut().zip(args).enumerate() {
        *slot = arg
            .as_str()
            .ok_or(RequestError::InvalidArgument { command, index })?
            .to_string();
    }
    Ok(out)
}

fn course(command: &'static str, args: &[RespValue]) -> Result<Course, RequestError> {
    let [record] = exact::<1>(command, args)?;
    Course::from_resp(record).ok_or(RequestError::InvalidArgument { command, index: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(parts: &[&str]) -> RespValue {
        RespValue::Array(parts.iter().map(|s| RespValue::from(*s)).collect())
    }

    #[test]
    fn test_parse_two_argument_request() {
        assert_eq!(
            Request::parse(frame(&["AUTHENTICATE", "S1", "pw"])),
            Ok(Request::Authenticate {
                student_number: "S1".into(),
                password: "pw".into(),
            })
        );
    }

    #[test]
    fn test_command_name_is_case_insensitive() {
        assert_eq!(
            Request::parse(frame(&["get_courses"])),
            Ok(Request::GetCourses)
        );
    }

    #[test]
    fn test_parse_record_argument() {
        let value = RespValue::Array(vec![
            "ADD_STUDENT".into(),
            RespValue::Array(vec!["S1".into(), "Alice".into(), "pw".into()]),
        ]);
        assert_eq!(
            Request::parse(value),
            Ok(Request::AddStudent(Student::new("S1", "Alice", "pw")))
        );
    }

    #[test]
    fn test_malformed_record() {
        let value = RespValue::Array(vec!["ADD_COURSE".into(), "CS101".into()]);
        assert_eq!(
            Request::parse(value),
            Err(RequestError::InvalidArgument {
                command: "ADD_COURSE",
                index: 0
            })
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            Request::parse(frame(&["ENROLL_STUDENT", "S1"])),
            Err(RequestError::WrongArity {
                command: "ENROLL_STUDENT",
                expected: 2,
                got: 1
            })
        );
        assert!(Request::parse(frame(&["GET_COURSES", "extra"])).is_err());
    }

    #[test]
    fn test_non_string_argument() {
        let value = RespValue::Array(vec!["DELETE_COURSE".into(), RespValue::Integer(101)]);
        assert_eq!(
            Request::parse(value),
            Err(RequestError::InvalidArgument {
                command: "DELETE_COURSE",
                index: 0
            })
        );
    }

    #[test]
    fn test_unknown_and_exit() {
        assert_eq!(
            Request::parse(frame(&["DROP_TABLES"])),
            Ok(Request::Unknown("DROP_TABLES".into()))
        );
        assert_eq!(Request::parse(frame(&["exit"])), Ok(Request::Exit));
    }

    #[test]
    fn test_invalid_frames() {
        assert_eq!(
            Request::parse(RespValue::from("GET_COURSES")),
            Err(RequestError::NotAnArray)
        );
        assert_eq!(
            Request::parse(RespValue::Array(vec![])),
            Err(RequestError::Empty)
        );
        assert_eq!(
            Request::parse(RespValue::Array(vec![RespValue::Integer(1)])),
            Err(RequestError::InvalidName)
        );
    }

    #[test]
    fn test_name_round_trips_through_parse() {
        let request = Request::parse(frame(&["COUNT_COURSE_ENROLLMENTS", "CS101"])).unwrap();
        assert_eq!(request.name(), "COUNT_COURSE_ENROLLMENTS");
    }
}
