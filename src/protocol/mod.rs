//! Wire Protocol
//!
//! Requests and responses are RESP-style tagged values. A request is an
//! array whose first element names the operation; the remaining elements are
//! its arguments in a fixed order. Every request except `EXIT` is answered
//! with exactly one value.
//!
//! ## Modules
//!
//! - `types`: The `RespValue` enum and serialization
//! - `parser`: Incremental parser for incoming frames
//! - `records`: Encoding of students, courses and enrollment records
//!
//! ## Example
//!
//! ```
//! use enrolld::protocol::{parse_message, RespValue};
//!
//! let data = b"*2\r\n$19\r\nGET_STUDENT_COURSES\r\n$2\r\nS1\r\n";
//! let (_request, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! let reply = RespValue::boolean(true).serialize();
//! assert_eq!(reply, b"#t\r\n");
//! ```

pub mod parser;
pub mod records;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
