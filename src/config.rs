//! Runtime configuration parameters
//!
//! Duty timings, detection behaviour and the grow board's moisture rule.
//! Defaults reproduce the shipped firmware; a JSON override can be
//! supplied at start-up and is validated before use.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::readings::MOISTURE_CHANNELS;

/// Core runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    // --- Timing ---
    /// Sensor poll period (seconds)
    pub sensor_interval_secs: u32,
    /// Activity LED toggle period (milliseconds)
    pub blink_interval_ms: u32,
    /// Pump automation tick (milliseconds)
    pub automation_interval_ms: u32,

    // --- BLE ---
    /// Advertising interval (microseconds)
    pub adv_interval_us: u32,

    // --- Boot ---
    /// Board detection attempts; 1 disables retry
    pub detect_attempts: u8,

    // --- Grow ---
    pub moisture: MoistureConfig,
}

/// Moisture-driven watering rule (grow board only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoistureConfig {
    /// Let moisture readings request pump changes
    pub enabled: bool,
    /// Per-channel target moisture (0-100%)
    pub targets_percent: [f32; MOISTURE_CHANNELS],
    /// Dead band above target before the pump is switched off
    pub hysteresis_percent: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sensor_interval_secs: 60,
            blink_interval_ms: 1000,
            automation_interval_ms: 1000,
            adv_interval_us: 250_000,
            detect_attempts: 1,
            moisture: MoistureConfig::default(),
        }
    }
}

impl Default for MoistureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            targets_percent: [50.0; MOISTURE_CHANNELS],
            hysteresis_percent: 5.0,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a JSON override. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values rather than clamping them.
    pub fn validate(&self) -> Result<()> {
        if self.sensor_interval_secs == 0 {
            return Err(Error::Config("sensor_interval_secs must be > 0"));
        }
        if self.blink_interval_ms == 0 {
            return Err(Error::Config("blink_interval_ms must be > 0"));
        }
        if self.automation_interval_ms == 0 {
            return Err(Error::Config("automation_interval_ms must be > 0"));
        }
        if self.adv_interval_us == 0 {
            return Err(Error::Config("adv_interval_us must be > 0"));
        }
        if self.detect_attempts == 0 {
            return Err(Error::Config("detect_attempts must be >= 1"));
        }
        if !self
            .moisture
            .targets_percent
            .iter()
            .all(|t| (0.0..=100.0).contains(t))
        {
            return Err(Error::Config("moisture targets must be within 0-100%"));
        }
        let h = self.moisture.hysteresis_percent;
        if !h.is_finite() || h < 0.0 {
            return Err(Error::Config("moisture hysteresis must be >= 0"));
        }
        Ok(())
    }
}
