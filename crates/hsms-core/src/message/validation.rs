//! Field validation shared by the message builder and the configuration layer.

use std::fmt;

use thiserror::Error;

/// Builder fields named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Device,
    Context,
    Stream,
    Func,
    Header,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Device => "Device",
            Field::Context => "Context",
            Field::Stream => "Stream",
            Field::Func => "Func",
            Field::Header => "Header",
        };
        f.write_str(name)
    }
}

/// Errors raised while building or constructing a data message.
#[derive(Debug, Error, PartialEq)]
pub enum MessageError {
    /// A message was requested without a builder to read it from.
    #[error("no message builder supplied")]
    MissingBuilder,

    /// A message was requested from more than one builder.
    #[error("too many constructor arguments: expected 1 builder, got {count}")]
    TooManyArguments { count: usize },

    /// A numeric field value does not fit the field's bit width.
    #[error("invalid format: {field} value {value} is outside 0..={max}")]
    OutOfRange { field: Field, value: i64, max: u32 },

    /// A textual input could not be interpreted for the field.
    #[error("invalid format: {field}: {reason}")]
    InvalidFormat { field: Field, reason: String },
}

fn in_range<T>(value: i64, field: Field, max: u32) -> Result<T, MessageError>
where
    T: TryFrom<i64>,
{
    T::try_from(value).map_err(|_| MessageError::OutOfRange { field, value, max })
}

/// Checks that `value` fits an unsigned 8-bit field.
pub(crate) fn ubyte_in_range(value: i64, field: Field) -> Result<u8, MessageError> {
    in_range(value, field, u8::MAX as u32)
}

/// Checks that `value` fits an unsigned 16-bit field.
pub(crate) fn ushort_in_range(value: i64, field: Field) -> Result<u16, MessageError> {
    in_range(value, field, u16::MAX as u32)
}

/// Checks that `value` fits an unsigned 32-bit field.
pub(crate) fn uint_in_range(value: i64, field: Field) -> Result<u32, MessageError> {
    in_range(value, field, u32::MAX)
}

/// Stream, function and wait marker read from `SxFy` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamFunction {
    pub stream: u8,
    pub func: u8,
    pub wait: bool,
}

/// Parses `SxFy` notation, optionally followed by a single `W` wait marker.
///
/// Matching is case-insensitive and surrounding whitespace is ignored, so
/// the short form produced by `Display` (`"S3F6  W"`) parses back.
pub(crate) fn parse_stream_function(text: &str) -> Result<StreamFunction, MessageError> {
    let malformed = |reason: &str| MessageError::InvalidFormat {
        field: Field::Header,
        reason: format!("{reason} in {text:?}"),
    };

    let upper = text.trim().to_ascii_uppercase();
    let (body, wait) = match upper.strip_suffix('W') {
        Some(rest) => (rest.trim_end(), true),
        None => (upper.as_str(), false),
    };
    let rest = body
        .strip_prefix('S')
        .ok_or_else(|| malformed("expected leading 'S'"))?;
    let (stream, func) = rest
        .split_once('F')
        .ok_or_else(|| malformed("expected 'F' separator"))?;

    let stream = parse_digits(stream).ok_or_else(|| malformed("stream is not a number"))?;
    let func = parse_digits(func).ok_or_else(|| malformed("function is not a number"))?;

    Ok(StreamFunction {
        stream: ubyte_in_range(stream, Field::Stream)?,
        func: ubyte_in_range(func, Field::Func)?,
        wait,
    })
}

/// Unsigned decimal digits only; signs and inner whitespace are rejected.
fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Anything too long for i64 is out of range for every header field.
    Some(text.parse().unwrap_or(i64::MAX))
}
