//! Simulation adapters for running the runtime on the host.
//!
//! | Adapter          | Implements              | Simulates                      |
//! |------------------|-------------------------|--------------------------------|
//! | `SimBus`         | embedded-hal I2c        | I²C devices fitted per model   |
//! | `SimSensePin`    | SensePin                | GPIO 12 pull-up sample         |
//! | `SimBoard`       | BoardDriver             | Sensor drivers                 |
//! | `SimPin`         | embedded-hal OutputPin  | Pump MOSFET gate               |
//! | `SimPwm`         | embedded-hal SetDutyCycle | Activity LED PWM slice       |
//! | `SimGattServer`  | GattServer              | Attribute database             |
//! | `SimAdvertiser`  | Advertiser / Connection | GAP + one central, scripted    |
//!
//! The BLE pair is driven by a [`SimCentral`] pushing [`SimLinkEvent`]s
//! into a shared channel; the advertiser and its connections consume them.

use core::cell::Cell;
use core::convert::Infallible;
use std::collections::BTreeMap;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embedded_hal::i2c;
use log::debug;

use crate::app::ports::{
    Advertiser, BoardDriver, Connection, ConnectionEvent, GattServer, PeerAddress, SensePin, WaitError, WriteValue,
};
use crate::ble::adv::AdvertisingParams;
use crate::ble::gatt::{CharacteristicHandle, ServiceDef};
use crate::board::{BoardModel, CapabilitySet, capabilities_for};
use crate::codec::Quantity;
use crate::drivers::bus_scan::I2cBusProbe;
use crate::error::{BleError, SensorError};
use crate::pins;
use crate::readings::Readings;

/// BME280 / BME688 environmental sensor, fitted on every board.
const ENV_SENSOR_ADDR: u8 = 0x76;

// ───────────────────────────────────────────────────────────────
// Board identity
// ───────────────────────────────────────────────────────────────

/// I²C bus on which only the board's fitted devices acknowledge.
pub struct SimBus {
    devices: Vec<u8>,
}

impl SimBus {
    pub fn new(addresses: &[u8]) -> Self {
        Self { devices: addresses.to_vec() }
    }

    /// Devices a real board of `model` answers with.
    pub fn for_model(model: BoardModel) -> Self {
        match model {
            BoardModel::Indoor => Self::new(&[pins::INDOOR_LIGHT_SENSOR_ADDR, ENV_SENSOR_ADDR]),
            BoardModel::Weather | BoardModel::Grow => Self::new(&[pins::LTR559_ADDR, ENV_SENSOR_ADDR]),
            BoardModel::Urban => Self::new(&[ENV_SENSOR_ADDR]),
        }
    }
}

impl i2c::ErrorType for SimBus {
    type Error = i2c::ErrorKind;
}

impl i2c::I2c for SimBus {
    fn transaction(&mut self, address: u8, operations: &mut [i2c::Operation<'_>]) -> Result<(), i2c::ErrorKind> {
        if !self.devices.contains(&address) {
            return Err(i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
        }
        for op in operations {
            if let i2c::Operation::Read(buf) = op {
                buf.fill(0);
            }
        }
        Ok(())
    }
}

/// Bus probe for a simulated board of `model`.
pub fn bus_probe(model: BoardModel) -> I2cBusProbe<SimBus> {
    I2cBusProbe::new(SimBus::for_model(model))
}

pub struct SimSensePin {
    level: bool,
    pulled: bool,
    samples: usize,
}

impl SimSensePin {
    pub fn new(level: bool) -> Self {
        Self { level, pulled: false, samples: 0 }
    }

    /// Grow boards hold the pin low through the pump 3 circuit.
    pub fn for_model(model: BoardModel) -> Self {
        Self::new(model != BoardModel::Grow)
    }

    pub fn is_pulled(&self) -> bool {
        self.pulled
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl SensePin for SimSensePin {
    fn sample_pulled_up(&mut self) -> bool {
        self.pulled = true;
        self.samples += 1;
        self.level
    }

    fn release_pull(&mut self) {
        self.pulled = false;
    }
}

// ───────────────────────────────────────────────────────────────
// Sensors
// ───────────────────────────────────────────────────────────────

/// Synthetic readings for every quantity the board has.
///
/// Temperature drifts slowly, rainfall accumulates with elapsed time and
/// the moisture channels dry out a little each cycle.
pub struct SimBoard {
    capabilities: CapabilitySet,
    cycle: u32,
    moisture: [f32; 3],
}

impl SimBoard {
    pub fn new(model: BoardModel) -> Self {
        Self {
            capabilities: capabilities_for(model),
            cycle: 0,
            moisture: [62.0, 48.0, 75.0],
        }
    }
}

impl BoardDriver for SimBoard {
    fn read_sensors(&mut self, elapsed_secs: f32) -> Result<Readings, SensorError> {
        let mut readings = Readings::new();
        let drift = (self.cycle % 20) as f32 * 0.05;
        for &quantity in self.capabilities.sensors {
            let value = match quantity {
                Quantity::Temperature => 21.4 + drift,
                Quantity::Humidity => 47.5 - drift,
                Quantity::Pressure => 1013.2,
                Quantity::RainRate => elapsed_secs * 0.002,
                Quantity::Luminance => 1200.0 + drift * 100.0,
            };
            readings.set(quantity, value);
        }
        for channel in 0..self.capabilities.moisture_channels {
            let level = &mut self.moisture[channel];
            *level = (*level - 1.5).max(0.0);
            readings.set_moisture(channel, *level);
        }
        self.cycle = self.cycle.wrapping_add(1);
        Ok(readings)
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO / PWM
// ───────────────────────────────────────────────────────────────

pub struct SimPin {
    gpio: u8,
    high: bool,
}

impl SimPin {
    pub fn new(gpio: u8) -> Self {
        Self { gpio, high: false }
    }

    /// The three pump gates.
    pub fn pump_bank() -> [Self; 3] {
        pins::PUMP_PINS.map(Self::new)
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        debug!("sim: GPIO{} low", self.gpio);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        debug!("sim: GPIO{} high", self.gpio);
        Ok(())
    }
}

#[derive(Default)]
pub struct SimPwm {
    duty: u16,
}

impl SimPwm {
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl embedded_hal::pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl embedded_hal::pwm::SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.duty = duty;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Attribute database
// ───────────────────────────────────────────────────────────────

struct Attribute {
    uuid: u16,
    value: Vec<u8>,
}

/// In-memory GATT server. Values are replaced whole on every write.
#[derive(Default)]
pub struct SimGattServer {
    registered: bool,
    attributes: BTreeMap<u16, Attribute>,
    writes: usize,
}

impl SimGattServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Current value of a characteristic, as a central would read it.
    pub fn value(&self, handle: CharacteristicHandle) -> Option<&[u8]> {
        self.attributes.get(&handle.0).map(|a| a.value.as_slice())
    }

    /// First characteristic with `uuid`, in handle order.
    pub fn value_by_uuid(&self, uuid: u16) -> Option<&[u8]> {
        self.attributes
            .values()
            .find(|a| a.uuid == uuid)
            .map(|a| a.value.as_slice())
    }

    pub fn characteristic_count(&self) -> usize {
        self.attributes.len()
    }

    /// Writes accepted since registration.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl GattServer for SimGattServer {
    fn register_services(&mut self, services: &[ServiceDef]) -> Result<(), BleError> {
        if self.registered {
            return Err(BleError::RegistrationClosed);
        }
        for characteristic in services.iter().flat_map(|s| &s.characteristics) {
            self.attributes.insert(
                characteristic.handle.0,
                Attribute {
                    uuid: characteristic.uuid,
                    value: characteristic.initial.clone(),
                },
            );
        }
        self.registered = true;
        Ok(())
    }

    fn write(&mut self, handle: CharacteristicHandle, value: &[u8]) -> Result<(), BleError> {
        let attribute = self
            .attributes
            .get_mut(&handle.0)
            .ok_or(BleError::UnknownHandle(handle.0))?;
        attribute.value = value.to_vec();
        self.writes += 1;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Scripted BLE link
// ───────────────────────────────────────────────────────────────

/// What the simulated central (or the stack) does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimLinkEvent {
    Connect(PeerAddress),
    Write { handle: CharacteristicHandle, value: WriteValue },
    Disconnect,
    Cancel,
    TimeOut,
    StackFailure(i32),
}

type LinkChannel = Channel<NoopRawMutex, SimLinkEvent, 8>;

/// NimBLE's "invalid argument" return code, used for rejected adv data.
const ADV_DATA_REJECTED: i32 = 3;

/// Create a connected advertiser / central pair.
pub fn link() -> (SimAdvertiser, SimCentral) {
    let channel = Rc::new(LinkChannel::new());
    let advertised = Rc::new(Cell::new(0));
    (
        SimAdvertiser {
            channel: Rc::clone(&channel),
            advertised: Rc::clone(&advertised),
        },
        SimCentral { channel, advertised },
    )
}

pub struct SimAdvertiser {
    channel: Rc<LinkChannel>,
    advertised: Rc<Cell<usize>>,
}

impl Advertiser for SimAdvertiser {
    type Connection = SimConnection;

    async fn advertise(&mut self, params: &AdvertisingParams) -> Result<SimConnection, WaitError> {
        let payload = params.payload().map_err(|_| WaitError::Stack(ADV_DATA_REJECTED))?;
        self.advertised.set(self.advertised.get() + 1);
        debug!(
            "sim: advertising '{}' every {} units ({} bytes)",
            params.name,
            params.interval_units(),
            payload.len()
        );
        loop {
            match self.channel.receive().await {
                SimLinkEvent::Connect(peer) => {
                    return Ok(SimConnection {
                        peer,
                        channel: Rc::clone(&self.channel),
                    });
                }
                SimLinkEvent::Cancel => return Err(WaitError::Cancelled),
                SimLinkEvent::TimeOut => return Err(WaitError::TimedOut),
                SimLinkEvent::StackFailure(rc) => return Err(WaitError::Stack(rc)),
                other => debug!("sim: {other:?} while advertising, dropped"),
            }
        }
    }
}

pub struct SimConnection {
    peer: PeerAddress,
    channel: Rc<LinkChannel>,
}

impl Connection for SimConnection {
    fn peer(&self) -> PeerAddress {
        self.peer
    }

    async fn next_event(&mut self) -> Result<ConnectionEvent, WaitError> {
        loop {
            match self.channel.receive().await {
                SimLinkEvent::Write { handle, value } => return Ok(ConnectionEvent::Write { handle, value }),
                SimLinkEvent::Disconnect => return Ok(ConnectionEvent::Disconnected),
                SimLinkEvent::Cancel => return Err(WaitError::Cancelled),
                SimLinkEvent::TimeOut => return Err(WaitError::TimedOut),
                SimLinkEvent::StackFailure(rc) => return Err(WaitError::Stack(rc)),
                SimLinkEvent::Connect(_) => debug!("sim: second central refused"),
            }
        }
    }
}

/// The scripting end of the link.
pub struct SimCentral {
    channel: Rc<LinkChannel>,
    advertised: Rc<Cell<usize>>,
}

impl SimCentral {
    pub async fn send(&self, event: SimLinkEvent) {
        self.channel.send(event).await;
    }

    pub async fn connect(&self, peer: PeerAddress) {
        self.send(SimLinkEvent::Connect(peer)).await;
    }

    /// Write `value`, truncated to the 20-byte ATT payload.
    pub async fn write(&self, handle: CharacteristicHandle, value: &[u8]) {
        let mut buf = WriteValue::new();
        let _ = buf.extend_from_slice(&value[..value.len().min(buf.capacity())]);
        self.send(SimLinkEvent::Write { handle, value: buf }).await;
    }

    pub async fn disconnect(&self) {
        self.send(SimLinkEvent::Disconnect).await;
    }

    pub async fn cancel(&self) {
        self.send(SimLinkEvent::Cancel).await;
    }

    /// How many times advertising has been entered.
    pub fn advertise_count(&self) -> usize {
        self.advertised.get()
    }
}
