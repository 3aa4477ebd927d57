//! Incremental Request Parser
//!
//! Clients send one request frame per operation, but TCP gives no framing
//! guarantees: a read may carry half a frame or several frames at once.
//! The parser therefore reads from a buffer and returns either:
//! - `Ok(Some((value, consumed)))` - A complete value, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the frame is incomplete
//! - `Err(ParseError)` - Invalid protocol data
//!
//! The caller appends network data to a buffer, calls `parse()`, and on
//! success advances the buffer by `consumed` bytes.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors that can occur during parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid integer format
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string or error message
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Boolean payload other than `t` or `f`
    #[error("invalid boolean: {0:?}")]
    InvalidBoolean(String),

    /// Protocol violation (missing CRLF, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The frame exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string. Record fields are short, 1 MB is plenty.
pub const MAX_BULK_SIZE: usize = 1024 * 1024;

/// Maximum array nesting depth. A request nests at most one record.
pub const MAX_NESTING_DEPTH: usize = 8;

/// An incremental parser for request frames.
///
/// # Example
///
/// ```ignore
/// use enrolld::protocol::parser::RespParser;
/// use bytes::BytesMut;
///
/// let mut parser = RespParser::new();
/// let mut buffer = BytesMut::from(&b"*1\r\n$11\r\nGET_COURSES\r\n"[..]);
///
/// if let Some((value, consumed)) = parser.parse(&buffer)? {
///     buffer.advance(consumed);
///     println!("Parsed: {:?}", value);
/// }
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    /// Current nesting depth (for array parsing)
    depth: usize,
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to parse one value from the start of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.depth = 0;
        self.parse_value(buf)
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => self.parse_line(buf, RespValue::SimpleString),
            prefix::ERROR => self.parse_line(buf, RespValue::Error),
            prefix::INTEGER => self.parse_integer(buf),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::BOOLEAN => self.parse_boolean(buf),
            prefix::ARRAY => self.parse_array(buf),
            _ => self.parse_inline(buf),
        }
    }

    /// Parses a line-terminated text value: `+<string>\r\n` or `-<message>\r\n`
    fn parse_line(
        &mut self,
        buf: &[u8],
        make: fn(String) -> RespValue,
    ) -> ParseResult<Option<(RespValue, usize)>> {
        match find_crlf(&buf[1..]) {
            Some(pos) => {
                let s = std::str::from_utf8(&buf[1..1 + pos])
                    .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

                // +1 for prefix, +2 for CRLF
                Ok(Some((make(s.to_string()), 1 + pos + 2)))
            }
            None => Ok(None),
        }
    }

    /// Parses an integer: `:<integer>\r\n`
    fn parse_integer(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        match read_length_line(buf)? {
            Some((n, consumed)) => Ok(Some((RespValue::Integer(n), consumed))),
            None => Ok(None),
        }
    }

    /// Parses a boolean: `#t\r\n` or `#f\r\n`
    fn parse_boolean(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let pos = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let value = match &buf[1..1 + pos] {
            b"t" => true,
            b"f" => false,
            other => {
                return Err(ParseError::InvalidBoolean(
                    String::from_utf8_lossy(other).into_owned(),
                ))
            }
        };

        Ok(Some((RespValue::Boolean(value), 1 + pos + 2)))
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`
    fn parse_bulk_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (length, data_start) = match read_length_line(buf)? {
            Some(line) => line,
            None => return Ok(None),
        };

        if length == -1 {
            return Ok(Some((RespValue::Null, data_start)));
        }

        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;

        if length > MAX_BULK_SIZE {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let total_needed = data_start + length + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[data_start + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);

        Ok(Some((RespValue::BulkString(data), total_needed)))
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (count, mut consumed) = match read_length_line(buf)? {
            Some(line) => line,
            None => return Ok(None),
        };

        if count == -1 {
            return Ok(Some((RespValue::Null, consumed)));
        }

        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        let mut elements = Vec::with_capacity(count.min(64));

        self.depth += 1;

        for _ in 0..count {
            if consumed >= buf.len() {
                return Ok(None);
            }

            match self.parse_value(&buf[consumed..])? {
                Some((value, element_consumed)) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                None => return Ok(None),
            }
        }

        self.depth -= 1;

        Ok(Some((RespValue::Array(elements), consumed)))
    }

    /// Parses a whitespace-separated inline command such as `GET_COURSES\r\n`.
    fn parse_inline(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let crlf_pos = match find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let line = std::str::from_utf8(&buf[..crlf_pos])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

        let elements: Vec<RespValue> = line
            .split_whitespace()
            .map(|s| RespValue::BulkString(Bytes::from(s.to_string())))
            .collect();

        if elements.is_empty() {
            return Err(ParseError::ProtocolError("empty inline command".to_string()));
        }

        Ok(Some((RespValue::Array(elements), crlf_pos + 2)))
    }
}

/// Reads the integer that follows a type prefix.
///
/// Returns the integer and the offset just past its CRLF.
fn read_length_line(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let end = match find_crlf(&buf[1..]) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let text = std::str::from_utf8(&buf[1..1 + end])
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    let n: i64 = text
        .parse()
        .map_err(|e: ParseIntError| ParseError::InvalidInteger(e.to_string()))?;

    Ok(Some((n, 1 + end + 2)))
}

/// Finds the position of CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Parses a single value from bytes with a fresh parser.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_array() {
        let input = b"*3\r\n$14\r\nENROLL_STUDENT\r\n$2\r\nS1\r\n$5\r\nCS101\r\n";
        let (value, consumed) = parse_message(input).unwrap().unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::from("ENROLL_STUDENT"),
                RespValue::from("S1"),
                RespValue::from("CS101"),
            ])
        );
        assert_eq!(consumed, input.len());
    }

    #[test]
    fn test_parse_nested_record() {
        let input = b"*2\r\n$10\r\nADD_COURSE\r\n*3\r\n$5\r\nCS101\r\n$5\r\nIntro\r\n$-1\r\n";
        let (value, _) = parse_message(input).unwrap().unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::from("ADD_COURSE"),
                RespValue::Array(vec![
                    RespValue::from("CS101"),
                    RespValue::from("Intro"),
                    RespValue::Null,
                ]),
            ])
        );
    }

    #[test]
    fn test_parse_boolean() {
        let (value, consumed) = parse_message(b"#t\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Boolean(true));
        assert_eq!(consumed, 4);

        let (value, _) = parse_message(b"#f\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Boolean(false));

        assert!(matches!(
            parse_message(b"#x\r\n"),
            Err(ParseError::InvalidBoolean(_))
        ));
    }

    #[test]
    fn test_parse_null_bulk_string() {
        let (value, consumed) = parse_message(b"$-1\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Null);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_integer() {
        let (value, consumed) = parse_message(b":17\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Integer(17));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_incomplete_frames() {
        assert!(parse_message(b"*2\r\n$11\r\nGET_COU").unwrap().is_none());
        assert!(parse_message(b"*2\r\n$4\r\nPING\r\n").unwrap().is_none());
        assert!(parse_message(b"$5\r\nhel").unwrap().is_none());
        assert!(parse_message(b"#t").unwrap().is_none());
    }

    #[test]
    fn test_parse_inline_command() {
        let (value, consumed) = parse_message(b"GET_COURSE_STUDENTS CS101\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(consumed, 27);
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::from("GET_COURSE_STUDENTS"),
                RespValue::from("CS101"),
            ])
        );
    }

    #[test]
    fn test_empty_inline_command_is_rejected() {
        assert!(matches!(
            parse_message(b"   \r\n"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_bulk_string_size_limit() {
        let input = format!("${}\r\n", MAX_BULK_SIZE + 1);
        assert!(matches!(
            parse_message(input.as_bytes()),
            Err(ParseError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_bulk_string_missing_crlf() {
        assert!(matches!(
            parse_message(b"$2\r\nS1xx"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_parse_invalid_integer() {
        assert!(matches!(
            parse_message(b":many\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let input = "*1\r\n".repeat(MAX_NESTING_DEPTH + 2) + ":1\r\n";
        assert!(matches!(
            parse_message(input.as_bytes()),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_serialized_reply_parses_back() {
        let reply = RespValue::Array(vec![
            RespValue::from("S1"),
            RespValue::from("Alice"),
            RespValue::from("CS101"),
            RespValue::from("Intro"),
        ]);
        let bytes = reply.serialize();
        let (parsed, consumed) = parse_message(&bytes).unwrap().unwrap();
        assert_eq!(parsed, reply);
        assert_eq!(consumed, bytes.len());
    }
}
