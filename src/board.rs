//! Board variant detection and capability lookup.
//!
//! One firmware image serves four boards. The variant is decided once at
//! boot from what answers on the sensor bus and, for the two boards that
//! share a light sensor, the level of a pulled-up sense pin:
//!
//! ```text
//!   0x38 present ─────────────────────────▶ indoor
//!   0x23 present ──▶ sense pin high ──────▶ weather
//!                └─▶ sense pin low  ──────▶ grow
//!   neither ──────────────────────────────▶ urban
//! ```
//!
//! The decision is never revisited. A misread at boot holds until reboot.

use core::fmt;
use core::str::FromStr;

use log::{info, warn};

use crate::app::ports::{BusProbe, SensePin};
use crate::codec::Quantity;
use crate::error::{Error, Result};
use crate::pins;
use crate::readings::MOISTURE_CHANNELS;

/// Pump channels fitted to the grow board.
pub const PUMP_CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardModel {
    Indoor,
    Weather,
    Grow,
    Urban,
}

impl BoardModel {
    pub const ALL: [BoardModel; 4] = [Self::Indoor, Self::Weather, Self::Grow, Self::Urban];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Indoor => "indoor",
            Self::Weather => "weather",
            Self::Grow => "grow",
            Self::Urban => "urban",
        }
    }
}

impl fmt::Display for BoardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoardModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or(Error::Config("unknown board model"))
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Fixed hardware inventory of a board variant.
///
/// `sensors` is in characteristic registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    pub sensors: &'static [Quantity],
    pub moisture_channels: usize,
    pub pump_channels: usize,
}

impl CapabilitySet {
    pub fn has(&self, quantity: Quantity) -> bool {
        self.sensors.contains(&quantity)
    }

    pub fn has_actuators(&self) -> bool {
        self.pump_channels > 0
    }
}

const BASE_SENSORS: &[Quantity] = &[Quantity::Temperature, Quantity::Humidity, Quantity::Pressure];

const LIGHT_SENSORS: &[Quantity] = &[
    Quantity::Temperature,
    Quantity::Humidity,
    Quantity::Pressure,
    Quantity::Luminance,
];

const WEATHER_SENSORS: &[Quantity] = &[
    Quantity::Temperature,
    Quantity::Humidity,
    Quantity::Pressure,
    Quantity::RainRate,
    Quantity::Luminance,
];

/// Capability lookup, total over every model.
pub const fn capabilities_for(model: BoardModel) -> CapabilitySet {
    match model {
        BoardModel::Indoor => CapabilitySet {
            sensors: LIGHT_SENSORS,
            moisture_channels: 0,
            pump_channels: 0,
        },
        BoardModel::Weather => CapabilitySet {
            sensors: WEATHER_SENSORS,
            moisture_channels: 0,
            pump_channels: 0,
        },
        BoardModel::Grow => CapabilitySet {
            sensors: LIGHT_SENSORS,
            moisture_channels: MOISTURE_CHANNELS,
            pump_channels: PUMP_CHANNELS,
        },
        BoardModel::Urban => CapabilitySet {
            sensors: BASE_SENSORS,
            moisture_channels: 0,
            pump_channels: 0,
        },
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Everything detection looks at, sampled up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSample {
    pub indoor_light_sensor: bool,
    pub ltr559: bool,
    /// Sense pin level; only sampled when `ltr559` is present.
    pub sense_pin_high: Option<bool>,
}

/// Pure decision over sampled inputs.
pub fn classify(sample: &BootSample) -> BoardModel {
    if sample.indoor_light_sensor {
        BoardModel::Indoor
    } else if sample.ltr559 {
        match sample.sense_pin_high {
            Some(false) => BoardModel::Grow,
            _ => BoardModel::Weather,
        }
    } else {
        BoardModel::Urban
    }
}

/// Scan the bus and, when needed, sample the sense pin.
///
/// Pin handling is sequenced explicitly: pull-up on, sample, pull
/// released. The pin is not touched unless the LTR-559 answered.
pub fn sample_inputs<B: BusProbe, S: SensePin>(bus: &mut B, sense: &mut S) -> Result<BootSample> {
    let devices = bus.scan()?;
    let indoor_light_sensor = devices.contains(&pins::INDOOR_LIGHT_SENSOR_ADDR);
    let ltr559 = devices.contains(&pins::LTR559_ADDR);

    let sense_pin_high = if !indoor_light_sensor && ltr559 {
        let level = sense.sample_pulled_up();
        sense.release_pull();
        Some(level)
    } else {
        None
    };

    Ok(BootSample { indoor_light_sensor, ltr559, sense_pin_high })
}

/// Detect the board model. Run once, before any duty starts.
///
/// With `attempts == 1` this is single-shot. Larger values re-sample
/// after a failed scan or an `urban` result, the two outcomes a bus
/// glitch produces.
pub fn detect<B: BusProbe, S: SensePin>(bus: &mut B, sense: &mut S, attempts: u8) -> Result<BoardModel> {
    let attempts = attempts.max(1);
    let mut outcome = Err(Error::Init("board detection not attempted"));

    for attempt in 1..=attempts {
        outcome = sample_inputs(bus, sense).map(|s| classify(&s));
        match outcome {
            Ok(model) if model != BoardModel::Urban => break,
            Ok(_) if attempt < attempts => info!("board: nothing identified, rescanning ({attempt}/{attempts})"),
            Err(e) if attempt < attempts => warn!("board: scan failed ({e}), retrying ({attempt}/{attempts})"),
            _ => {}
        }
    }

    let model = outcome?;
    info!("board: detected '{}' (sense pin GPIO{})", model, pins::BOARD_SENSE_PIN);
    Ok(model)
}
