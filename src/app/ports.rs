//! Port traits: the hexagonal boundary between the runtime and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ duties (runtime)
//! ```
//!
//! Board drivers, the BLE peripheral stack, GPIO/PWM and the clock are
//! driven adapters implementing these traits. The duties consume them via
//! generics, so the runtime never touches hardware directly and every
//! duty is testable on the host.
//!
//! The async ports return non-`Send` futures: every duty is polled on the
//! same single-threaded executor.

use core::time::Duration;

use crate::app::events::RuntimeEvent;
use crate::ble::adv::AdvertisingParams;
use crate::ble::gatt::{CharacteristicHandle, ServiceDef};
use crate::error::{ActuatorError, BleError, SensorError};
use crate::pump::PumpState;
use crate::readings::Readings;

// ───────────────────────────────────────────────────────────────
// Board probing (boot only)
// ───────────────────────────────────────────────────────────────

/// Addresses that acknowledged during a bus scan.
pub type BusDevices = heapless::Vec<u8, 32>;

/// Enumerates devices on the sensor bus.
pub trait BusProbe {
    fn scan(&mut self) -> Result<BusDevices, SensorError>;
}

/// The pull-up sense input that separates weather from grow boards.
pub trait SensePin {
    /// Enable the pull-up and sample the level (`true` = high).
    fn sample_pulled_up(&mut self) -> bool;

    /// Return the pin to no-pull so it can serve as a pump input again.
    fn release_pull(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Sensor acquisition
// ───────────────────────────────────────────────────────────────

/// Capability-typed reading acquisition provided by the board driver.
pub trait BoardDriver {
    /// Read every fitted sensor.
    ///
    /// `elapsed_secs` is the time since the previous call so that
    /// rate-dependent quantities (rainfall) can be accumulated.
    fn read_sensors(&mut self, elapsed_secs: f32) -> Result<Readings, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuators
// ───────────────────────────────────────────────────────────────

/// Linear brightness primitive for the activity LED.
pub trait IndicatorLed {
    /// Set brightness in percent (0–100). Gamma correction is the
    /// implementation's concern.
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError>;
}

/// Digital outputs driving the pump channels.
pub trait PumpOutputs {
    fn set_output(&mut self, channel: usize, state: PumpState) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// BLE peripheral stack
// ───────────────────────────────────────────────────────────────

/// The attribute database side of the peripheral stack.
pub trait GattServer {
    /// Publish every service. One-shot: a second call must fail with
    /// [`BleError::RegistrationClosed`].
    fn register_services(&mut self, services: &[ServiceDef]) -> Result<(), BleError>;

    /// Replace a characteristic value and notify a subscribed central.
    /// The replacement is a single buffer swap; readers never see a mix
    /// of old and new bytes.
    fn write(&mut self, handle: CharacteristicHandle, value: &[u8]) -> Result<(), BleError>;
}

/// Why a wait on the peripheral stack ended without an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The wait was cancelled by an external stop signal.
    Cancelled,
    /// Advertising or the connection wait timed out.
    TimedOut,
    /// The stack itself failed.
    Stack(i32),
}

/// Bluetooth device address of a connected central.
pub type PeerAddress = [u8; 6];

/// Characteristic value written by a central.
pub type WriteValue = heapless::Vec<u8, 20>;

/// Something a connected central did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The central wrote to a writable characteristic.
    Write { handle: CharacteristicHandle, value: WriteValue },
    /// The link dropped.
    Disconnected,
}

/// A live link to one central.
pub trait Connection {
    fn peer(&self) -> PeerAddress;

    /// Suspend until the central writes or disconnects.
    async fn next_event(&mut self) -> Result<ConnectionEvent, WaitError>;
}

/// The GAP side of the peripheral stack.
pub trait Advertiser {
    type Connection: Connection;

    /// Advertise until a central connects, the wait is cancelled, or it
    /// times out.
    async fn advertise(&mut self, params: &AdvertisingParams) -> Result<Self::Connection, WaitError>;
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time and the duties' only sleep primitive.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Suspend the calling duty for `duration`.
    async fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink (runtime → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// Duties emit structured [`RuntimeEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &RuntimeEvent);
}
