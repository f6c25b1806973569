//! Crate-wide error taxonomy
//!
//! Three tiers, matching how failures are handled rather than where they
//! occur: configuration problems are rejected before any hardware command is
//! issued, transport problems abort the active pass, and reply-format
//! problems are recovered in place (see [`reading`](crate::reading)).

use std::{ error::Error, fmt, io };

/// A failure on the relay or instrument transport
#[derive(Debug)]
pub enum DeviceError
{
    /// No channel is open; the handle was disconnected or never given one
    NotConnected,
    /// The underlying transport reported an error
    Io(io::Error),
}

impl fmt::Display for DeviceError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::NotConnected => f.write_str("Device is not connected"),
            Self::Io(io_err) => write!(f, "Transport failure. {}", io_err),
        }
    }
}

impl Error for DeviceError {}

impl From<io::Error> for DeviceError
{
    fn from(this: io::Error) -> Self
    {
        DeviceError::Io(this)
    }
}

/// A measurement configuration rejected before any hardware I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError
{
    /// A required field was never supplied
    MissingField(&'static str),
    /// A numeric field is not a finite number
    NotFinite(&'static str),
    /// A numeric field that must be strictly positive is not
    NonPositive(&'static str),
    /// The device name was supplied but is blank
    EmptyDeviceName,
    /// `voltage_max` does not exceed `voltage_min`
    InvertedVoltageWindow,
    /// `step_size` exceeds the voltage window
    StepExceedsWindow,
    /// A pixel bound lies outside `[1, 8]`
    PixelOutOfRange(u8),
    /// `pixel_from` exceeds `pixel_to`
    InvertedPixelRange,
}

impl fmt::Display for ConfigError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::MissingField(field) => write!(f, "Required field `{}` was not set", field),
            Self::NotFinite(field) => write!(f, "Field `{}` must be a finite number", field),
            Self::NonPositive(field) => write!(f, "Field `{}` must be greater than zero", field),
            Self::EmptyDeviceName => f.write_str("Device name must not be blank"),
            Self::InvertedVoltageWindow => f.write_str("`voltage_max` must exceed `voltage_min`"),
            Self::StepExceedsWindow => f.write_str("`step_size` must not exceed the voltage window"),
            Self::PixelOutOfRange(pixel) => write!(f, "Pixel {} lies outside the supported range 1-8", pixel),
            Self::InvertedPixelRange => f.write_str("`pixel_from` must not exceed `pixel_to`"),
        }
    }
}

impl Error for ConfigError {}

/// Top-level failure of a measurement run
#[derive(Debug)]
pub enum RunError
{
    /// The configuration was rejected; no hardware command was issued
    Config(ConfigError),
    /// A relay or instrument transport failure aborted the active pass
    Device(DeviceError),
    /// A completed trace could not be written out
    Storage(io::Error),
}

impl fmt::Display for RunError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Config(config_err) => write!(f, "Invalid configuration. {}", config_err),
            Self::Device(device_err) => write!(f, "Measurement aborted. {}", device_err),
            Self::Storage(io_err) => write!(f, "Failed to persist trace. {}", io_err),
        }
    }
}

impl Error for RunError {}

impl From<ConfigError> for RunError
{
    fn from(this: ConfigError) -> Self
    {
        RunError::Config(this)
    }
}

impl From<DeviceError> for RunError
{
    fn from(this: DeviceError) -> Self
    {
        RunError::Device(this)
    }
}
