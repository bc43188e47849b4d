//! Unified error types for the enviroble runtime.
//!
//! A single `Error` enum that every subsystem converts into, so the duty
//! join at the top of the runtime has one failure type to propagate.
//! All variants are `Copy` so they pass through duties and events without
//! allocation.

use core::fmt;

use crate::codec::Quantity;

// ---------------------------------------------------------------------------
// Top-level runtime error
// ---------------------------------------------------------------------------

/// Every fallible operation in the runtime funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Sensor acquisition failed or returned an incomplete reading set.
    Sensor(SensorError),
    /// A physical value could not be encoded into its wire format.
    Encode(EncodeError),
    /// An actuator (pump output, activity LED) command failed.
    Actuator(ActuatorError),
    /// The BLE peripheral stack reported a failure.
    Ble(BleError),
    /// Boot-time initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Ble(e) => write!(f, "ble: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I²C bus could not be driven at all.
    BusFault,
    /// The board driver failed to produce a reading set.
    ReadFailed,
    /// A registered quantity was absent from the reading set.
    MissingQuantity(Quantity),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFault => write!(f, "bus fault"),
            Self::ReadFailed => write!(f, "reading acquisition failed"),
            Self::MissingQuantity(q) => write!(f, "reading set is missing {}", q.name()),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Encoding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// NaN or infinite input.
    NonFinite(Quantity),
    /// The scaled value does not fit a signed 16-bit payload.
    OutOfRange(Quantity),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite(q) => write!(f, "{} is not finite", q.name()),
            Self::OutOfRange(q) => write!(f, "{} exceeds sint16 range after scaling", q.name()),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// Driving a pump output pin failed (carries the channel index).
    GpioWriteFailed(u8),
    /// Pump channel index outside the bank.
    NoSuchChannel(u8),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed(ch) => write!(f, "GPIO write failed on pump {ch}"),
            Self::NoSuchChannel(ch) => write!(f, "no pump channel {ch}"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// BLE errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    /// The peripheral stack returned a non-zero status code.
    StackFailure(i32),
    /// A write targeted a handle that was never registered.
    UnknownHandle(u16),
    /// Services were already published; the attribute table is frozen.
    RegistrationClosed,
    /// Advertising data does not fit the 31-byte legacy payload.
    PayloadTooLong,
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackFailure(rc) => write!(f, "stack failure (rc={rc})"),
            Self::UnknownHandle(h) => write!(f, "unknown attribute handle {h}"),
            Self::RegistrationClosed => write!(f, "services already registered"),
            Self::PayloadTooLong => write!(f, "advertising payload exceeds 31 bytes"),
        }
    }
}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Self::Ble(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Runtime-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
