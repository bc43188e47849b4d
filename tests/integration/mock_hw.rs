//! Mock hardware adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history, and provides a virtual clock so duty loops run without real
//! sleeps.

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use enviroble::app::events::RuntimeEvent;
use enviroble::app::ports::{BoardDriver, BusDevices, BusProbe, Clock, EventSink, IndicatorLed, PumpOutputs, SensePin};
use enviroble::board::{BoardModel, CapabilitySet, capabilities_for};
use enviroble::codec::Quantity;
use enviroble::error::{ActuatorError, SensorError};
use enviroble::pump::PumpState;
use enviroble::readings::Readings;

// ── Virtual clock ─────────────────────────────────────────────

/// Each sleep advances virtual time and yields exactly once.
#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration.as_millis() as u64);
        futures_lite::future::yield_now().await;
    }
}

/// Give the runtime `polls` scheduling rounds.
pub async fn settle(polls: usize) {
    for _ in 0..polls {
        futures_lite::future::yield_now().await;
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<RuntimeEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&RuntimeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &RuntimeEvent) {
        self.events.push(event.clone());
    }
}

// ── Boot inputs ───────────────────────────────────────────────

pub struct MockBus(pub Vec<u8>);

impl BusProbe for MockBus {
    fn scan(&mut self) -> Result<BusDevices, SensorError> {
        let mut found = BusDevices::new();
        for &addr in &self.0 {
            found.push(addr).map_err(|_| SensorError::BusFault)?;
        }
        Ok(found)
    }
}

/// Sense pin that counts how often detection sampled it.
pub struct MockSensePin {
    pub high: bool,
    pub pulled: bool,
    pub samples: usize,
}

impl MockSensePin {
    pub fn new(high: bool) -> Self {
        Self { high, pulled: false, samples: 0 }
    }
}

impl SensePin for MockSensePin {
    fn sample_pulled_up(&mut self) -> bool {
        self.pulled = true;
        self.samples += 1;
        self.high
    }

    fn release_pull(&mut self) {
        self.pulled = false;
    }
}

// ── Board driver ──────────────────────────────────────────────

/// Fixed readings for every capability; fails from call `fail_from` on.
pub struct MockBoard {
    capabilities: CapabilitySet,
    pub calls: usize,
    pub fail_from: Option<usize>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new(model: BoardModel) -> Self {
        Self {
            capabilities: capabilities_for(model),
            calls: 0,
            fail_from: None,
        }
    }

    pub fn failing_from(model: BoardModel, call: usize) -> Self {
        Self {
            fail_from: Some(call),
            ..Self::new(model)
        }
    }
}

impl BoardDriver for MockBoard {
    fn read_sensors(&mut self, _elapsed_secs: f32) -> Result<Readings, SensorError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_from.is_some_and(|n| call >= n) {
            return Err(SensorError::ReadFailed);
        }
        let mut readings = Readings::new();
        for &q in self.capabilities.sensors {
            let value = match q {
                Quantity::Temperature => 21.34,
                Quantity::Humidity => 40.0,
                Quantity::Pressure => 1000.5,
                Quantity::RainRate => 3.0,
                Quantity::Luminance => 1200.0,
            };
            readings.set(q, value);
        }
        for ch in 0..self.capabilities.moisture_channels {
            // Inside every channel's dead band: no automatic requests.
            readings.set_moisture(ch, 52.0);
        }
        Ok(readings)
    }
}

// ── Actuators ─────────────────────────────────────────────────

/// LED whose brightness history is shared with the test.
#[derive(Clone, Default)]
pub struct RecordingLed(pub Rc<RefCell<Vec<u8>>>);

impl IndicatorLed for RecordingLed {
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError> {
        self.0.borrow_mut().push(percent);
        Ok(())
    }
}

/// Pump outputs whose write history is shared with the test.
#[derive(Clone, Default)]
pub struct RecordingOutputs(pub Rc<RefCell<Vec<(usize, PumpState)>>>);

impl PumpOutputs for RecordingOutputs {
    fn set_output(&mut self, channel: usize, state: PumpState) -> Result<(), ActuatorError> {
        self.0.borrow_mut().push((channel, state));
        Ok(())
    }
}
