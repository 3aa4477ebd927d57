//! Wire Value Types
//!
//! Every request and response exchanged with a client is a single `RespValue`.
//! The encoding follows RESP (the Redis Serialization Protocol) with the RESP3
//! boolean type added, since most enrollment operations answer yes or no.
//!
//! ## Protocol Format
//!
//! Each value starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//! - `#` Boolean (`#t` or `#f`)
//!
//! All types are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Request: `*3\r\n$12\r\nAUTHENTICATE\r\n$2\r\nS1\r\n$2\r\npw\r\n`
//! Boolean reply: `#t\r\n`
//! Absent reply: `$-1\r\n`

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
    pub const BOOLEAN: u8 = b'#';
}

/// Represents a value on the wire.
///
/// The same type is used for parsing requests and serializing responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Short status text such as `PONG`.
    /// Format: `+<string>\r\n`
    SimpleString(String),

    /// An error condition.
    /// Format: `-<error message>\r\n`
    Error(String),

    /// 64-bit signed integers, used for counts.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe strings. Every record field travels as one of these.
    /// Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// A yes/no outcome.
    /// Format: `#t\r\n` or `#f\r\n`
    Boolean(bool),

    /// The absent marker: a missing record, an unknown command or a failed
    /// request. Serialized as the null bulk string `$-1\r\n`.
    Null,

    /// Requests, records and lists of records.
    /// Format: `*<count>\r\n<element1><element2>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Creates a new integer response.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a new bulk string.
    ///
    /// # Example
    /// ```
    /// use enrolld::protocol::types::RespValue;
    /// use bytes::Bytes;
    /// let bulk = RespValue::bulk_string(Bytes::from("CS101"));
    /// ```
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Creates a boolean response.
    pub fn boolean(b: bool) -> Self {
        RespValue::Boolean(b)
    }

    /// Creates a null response.
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Creates an array response.
    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// Common response for PING
    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes the value to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Boolean(b) => {
                buf.push(prefix::BOOLEAN);
                buf.push(if *b { b't' } else { b'f' });
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    /// Attempts to extract the inner string from SimpleString or BulkString.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Attempts to extract the inner array.
    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Consumes self and returns the inner array if this is an Array variant.
    pub fn into_array(self) -> Option<Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

impl From<bool> for RespValue {
    fn from(b: bool) -> Self {
        RespValue::Boolean(b)
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        RespValue::BulkString(Bytes::from(s))
    }
}

impl<T: Into<RespValue>> From<Option<T>> for RespValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RespValue::Null, Into::into)
    }
}

impl<T: Into<RespValue>> From<Vec<T>> for RespValue {
    fn from(values: Vec<T>) -> Self {
        RespValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            RespValue::Boolean(b) => write!(f, "(boolean) {}", b),
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    writeln!(f)?;
                    for (i, v) in values.iter().enumerate() {
                        writeln!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_serialize() {
        assert_eq!(RespValue::boolean(true).serialize(), b"#t\r\n");
        assert_eq!(RespValue::boolean(false).serialize(), b"#f\r\n");
    }

    #[test]
    fn test_null_serialize() {
        assert_eq!(RespValue::null().serialize(), b"$-1\r\n");
    }

    #[test]
    fn test_integer_serialize() {
        assert_eq!(RespValue::integer(42).serialize(), b":42\r\n");
    }

    #[test]
    fn test_record_array_serialize() {
        let value = RespValue::array(vec![
            RespValue::from("CS101"),
            RespValue::from("Intro"),
            RespValue::null(),
        ]);
        assert_eq!(
            value.serialize(),
            b"*3\r\n$5\r\nCS101\r\n$5\r\nIntro\r\n$-1\r\n"
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(RespValue::from(None::<String>), RespValue::Null);
        assert_eq!(
            RespValue::from(Some("desc".to_string())),
            RespValue::bulk_string(Bytes::from("desc"))
        );
    }

    #[test]
    fn test_pong_response() {
        assert_eq!(RespValue::pong().serialize(), b"+PONG\r\n");
    }
}
