//! GPIO / peripheral assignments shared by every board variant.
//!
//! Single source of truth: adapters reference this module rather than
//! hard-coding pin numbers or bus addresses.

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// Held high as early as possible to keep VSYS alive on battery.
pub const HOLD_VSYS_EN_PIN: u8 = 2;

// ---------------------------------------------------------------------------
// I²C bus (on-board sensors)
// ---------------------------------------------------------------------------

pub const I2C_SDA_PIN: u8 = 4;
pub const I2C_SCL_PIN: u8 = 5;
pub const I2C_FREQ_HZ: u32 = 100_000;

/// Colour / light sensor, only fitted to the indoor board.
pub const INDOOR_LIGHT_SENSOR_ADDR: u8 = 0x38;
/// LTR-559 light sensor, fitted to the grow and weather boards.
pub const LTR559_ADDR: u8 = 0x23;

/// First and last addresses probed by a bus scan (reserved ranges skipped).
pub const I2C_SCAN_FIRST: u8 = 0x08;
pub const I2C_SCAN_LAST: u8 = 0x77;

// ---------------------------------------------------------------------------
// Activity LED
// ---------------------------------------------------------------------------

pub const ACTIVITY_LED_PIN: u8 = 6;
pub const ACTIVITY_LED_PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// Grow board actuators and inputs
// ---------------------------------------------------------------------------

/// Pump outputs for channels A, B, C.
pub const PUMP_PINS: [u8; 3] = [10, 11, 12];
/// Moisture sensor inputs for channels A, B, C.
pub const MOISTURE_PINS: [u8; 3] = [15, 14, 13];

/// Sampled with pull-up at boot to tell weather (high) from grow (low).
/// Shared with pump C, so the pull must be released afterwards.
pub const BOARD_SENSE_PIN: u8 = PUMP_PINS[2];
