//! Command Module
//!
//! The request-processing layer. It turns parsed frames into typed requests,
//! runs them against the Stores, and produces one reply per request.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Frame Parser   │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Request::parse  │  (request.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (handler.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Stores      │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! ### Students
//! - `AUTHENTICATE number password`
//! - `ADD_STUDENT [number name password]`
//! - `GET_ALL_STUDENTS`
//! - `DELETE_STUDENT number`
//!
//! ### Courses
//! - `ADD_COURSE [code title description]`, `UPDATE_COURSE [code title description]`
//! - `GET_COURSES`, `GET_COURSE code`, `COURSE_EXISTS code`, `COUNT_COURSES`
//! - `SEARCH_COURSES term`
//! - `DELETE_COURSE code`
//!
//! ### Enrollments
//! - `ENROLL_STUDENT number code`, `UNENROLL_STUDENT number code`, `IS_ENROLLED number code`
//! - `GET_STUDENT_COURSES number`, `GET_COURSE_STUDENTS code`
//! - `GET_ALL_ENROLLMENTS`
//! - `COUNT_STUDENT_ENROLLMENTS number`, `COUNT_COURSE_ENROLLMENTS code`
//!
//! ### Session
//! - `PING`, `EXIT`

pub mod handler;
pub mod request;

// Re-export the main command handler
pub use handler::CommandHandler;
pub use request::{Request, RequestError};
