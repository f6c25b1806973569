//! Measurement reply parsing
//!
//! The instrument answers `:READ?` with a comma-delimited record; the
//! current reading sits at field index 1, in amperes. A malformed reply is
//! not fatal to a sweep (the engine substitutes a zeroed sample to keep the
//! voltage and current sequences aligned point for point), so the parse
//! failure is kept separate from transport failures, which do abort.

use std::{ error::Error, fmt };
use crate::error::DeviceError;

/// Zero-based position of the current reading in the `:READ?` reply
const CURRENT_FIELD: usize = 1;

/// Extracts the current reading, in amperes, from a `:READ?` reply line
pub(crate) fn parse_current_amps(reply: &str) -> Result<f64, ReplyFormatError>
{
    let field = match reply.split(',').nth(CURRENT_FIELD) {
        Some(field) => field,
        None => {
            return Err(ReplyFormatError {
                raw_reply: reply.to_string(),
                cause: ReplyErrorCause::MissingField,
            });
        }
    };

    field.trim().parse::<f64>().map_err(|float_err| ReplyFormatError {
        raw_reply: reply.to_string(),
        cause: ReplyErrorCause::InvalidDecimal(float_err),
    })
}

/// The underlying cause of a reply parsing failure
#[derive(Debug)]
enum ReplyErrorCause
{
    /// The reply ended before the current field
    MissingField,
    /// The current field did not parse as a decimal number
    InvalidDecimal(std::num::ParseFloatError),
}

/// A parsing error caused by a measurement reply of unexpected format
///
/// The reply is retained verbatim so a misbehaving instrument can be
/// diagnosed from the log alone.
#[derive(Debug)]
pub struct ReplyFormatError
{
    /// The reply line as received, line ending stripped
    pub raw_reply: String,
    cause: ReplyErrorCause,
}

impl fmt::Display for ReplyFormatError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.cause {
            ReplyErrorCause::MissingField => write!(
                f,
                "Reply {:?} has no field at index {}",
                self.raw_reply, CURRENT_FIELD,
            ),
            ReplyErrorCause::InvalidDecimal(float_err) => write!(
                f,
                "Field {} of reply {:?} is not a decimal number. Caused by: {}",
                CURRENT_FIELD, self.raw_reply, float_err,
            ),
        }
    }
}

impl Error for ReplyFormatError {}

/// An error describing a failed current reading
#[derive(Debug)]
pub enum ReadError
{
    /// The link failed while issuing the query or collecting the reply
    Device(DeviceError),
    /// The reply arrived but could not be interpreted
    Reply(ReplyFormatError),
}

impl fmt::Display for ReadError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Device(device_err) => write!(f, "Failed to query instrument. {}", device_err),
            Self::Reply(format_err) => write!(f, "Unreadable measurement. {}", format_err),
        }
    }
}

impl Error for ReadError {}

impl From<DeviceError> for ReadError
{
    fn from(this: DeviceError) -> Self
    {
        ReadError::Device(this)
    }
}

impl From<std::io::Error> for ReadError
{
    fn from(this: std::io::Error) -> Self
    {
        ReadError::Device(DeviceError::Io(this))
    }
}

impl From<ReplyFormatError> for ReadError
{
    fn from(this: ReplyFormatError) -> Self
    {
        ReadError::Reply(this)
    }
}
