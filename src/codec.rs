//! Characteristic payload codec.
//!
//! Maps each physical quantity to the 2-byte little-endian `sint16`
//! payload of its Environmental Sensing characteristic.
//!
//! | Quantity    | UUID   | Scale | Encoded unit                |
//! |-------------|--------|-------|-----------------------------|
//! | temperature | 0x2A6E | ×100  | 0.01 °C                     |
//! | pressure    | 0x2A6D | ×10   | 0.1 Pa                      |
//! | humidity    | 0x2A6F | ×100  | 0.01 %                      |
//! | rain_rate   | 0x2A78 | ×1    | 1 mm                        |
//! | luminance   | 0x2A77 | ÷12   | 0.1 W/m² (1 W/m² ≈ 120 lux) |
//!
//! Scaled values are truncated toward zero, never rounded. Existing
//! centrals decode with that assumption.

use core::fmt;

use crate::error::EncodeError;

/// Every quantity that has a wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    Temperature,
    Humidity,
    Pressure,
    RainRate,
    Luminance,
}

/// Lux per encoded luminance unit (120 lux per W/m², 10 units per W/m²).
const LUX_PER_UNIT: f32 = 120.0 / 10.0;

impl Quantity {
    pub const ALL: [Quantity; 5] = [
        Quantity::Temperature,
        Quantity::Humidity,
        Quantity::Pressure,
        Quantity::RainRate,
        Quantity::Luminance,
    ];

    /// Reading-set key used by board drivers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::RainRate => "rain_rate",
            Self::Luminance => "luminance",
        }
    }

    /// 16-bit SIG characteristic UUID.
    pub const fn uuid(self) -> u16 {
        match self {
            Self::Temperature => 0x2A6E,
            Self::Humidity => 0x2A6F,
            Self::Pressure => 0x2A6D,
            Self::RainRate => 0x2A78,
            Self::Luminance => 0x2A77,
        }
    }

    /// Size of one encoded unit in the quantity's physical unit.
    pub const fn resolution(self) -> f32 {
        match self {
            Self::Temperature | Self::Humidity => 0.01,
            Self::Pressure => 0.1,
            Self::RainRate => 1.0,
            Self::Luminance => LUX_PER_UNIT,
        }
    }

    fn scale(self, value: f32) -> f32 {
        match self {
            Self::Temperature | Self::Humidity => value * 100.0,
            Self::Pressure => value * 10.0,
            Self::RainRate => value,
            Self::Luminance => value / LUX_PER_UNIT,
        }
    }

    fn unscale(self, raw: f32) -> f32 {
        match self {
            Self::Temperature | Self::Humidity => raw / 100.0,
            Self::Pressure => raw / 10.0,
            Self::RainRate => raw,
            Self::Luminance => raw * LUX_PER_UNIT,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoded characteristic value.
pub type Payload = [u8; 2];

/// Encode `value` into its characteristic payload.
///
/// Rejects non-finite input and any value whose truncated scaled form
/// falls outside `i16`; a wrapped payload would look valid to a central.
pub fn encode(quantity: Quantity, value: f32) -> Result<Payload, EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::NonFinite(quantity));
    }
    let scaled = quantity.scale(value).trunc();
    if scaled < f32::from(i16::MIN) || scaled > f32::from(i16::MAX) {
        return Err(EncodeError::OutOfRange(quantity));
    }
    Ok((scaled as i16).to_le_bytes())
}

/// Decode a payload back into the physical unit.
pub fn decode(quantity: Quantity, payload: Payload) -> f32 {
    quantity.unscale(f32::from(i16::from_le_bytes(payload)))
}
