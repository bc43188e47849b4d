//! Advertising parameters and the legacy advertising payload.
//!
//! The payload carries, in order: flags, complete local name, the complete
//! list of 16-bit service UUIDs, and the GAP appearance.

use core::fmt::Write;

use crate::board::BoardModel;
use crate::error::BleError;

/// org.bluetooth.characteristic.gap.appearance: generic thermometer.
pub const APPEARANCE_GENERIC_THERMOMETER: u16 = 768;

/// Legacy advertising PDU data limit.
pub const MAX_ADV_PAYLOAD: usize = 31;

const AD_FLAGS: u8 = 0x01;
const AD_COMPLETE_UUID16_LIST: u8 = 0x03;
const AD_COMPLETE_LOCAL_NAME: u8 = 0x09;
const AD_APPEARANCE: u8 = 0x19;

/// LE General Discoverable | BR/EDR not supported.
const FLAGS_GENERAL_DISC_NO_BREDR: u8 = 0x06;

/// Radio advertising interval unit, in microseconds.
const ADV_INTERVAL_UNIT_US: u32 = 625;

pub type AdvName = heapless::String<24>;
pub type AdvPayload = heapless::Vec<u8, MAX_ADV_PAYLOAD>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingParams {
    pub interval_us: u32,
    pub name: AdvName,
    pub services: heapless::Vec<u16, 4>,
    pub appearance: u16,
}

impl AdvertisingParams {
    /// Parameters advertised by a board: `enviro-<model>`, the
    /// Environmental Sensing service, generic thermometer appearance.
    pub fn for_model(model: BoardModel, interval_us: u32) -> Self {
        let mut name = AdvName::new();
        // "enviro-" plus the longest model name is well under capacity.
        let _ = write!(name, "enviro-{}", model.name());
        let mut services = heapless::Vec::new();
        let _ = services.push(super::gatt::ENV_SENSING_SERVICE);
        Self {
            interval_us,
            name,
            services,
            appearance: APPEARANCE_GENERIC_THERMOMETER,
        }
    }

    /// Interval in 0.625 ms radio units.
    pub fn interval_units(&self) -> u16 {
        (self.interval_us / ADV_INTERVAL_UNIT_US).min(u32::from(u16::MAX)) as u16
    }

    /// Serialise the AD structures.
    pub fn payload(&self) -> Result<AdvPayload, BleError> {
        let mut out = AdvPayload::new();
        push_field(&mut out, AD_FLAGS, &[FLAGS_GENERAL_DISC_NO_BREDR])?;
        push_field(&mut out, AD_COMPLETE_LOCAL_NAME, self.name.as_bytes())?;

        if !self.services.is_empty() {
            let mut uuids = heapless::Vec::<u8, 8>::new();
            for uuid in &self.services {
                uuids
                    .extend_from_slice(&uuid.to_le_bytes())
                    .map_err(|()| BleError::PayloadTooLong)?;
            }
            push_field(&mut out, AD_COMPLETE_UUID16_LIST, &uuids)?;
        }

        push_field(&mut out, AD_APPEARANCE, &self.appearance.to_le_bytes())?;
        Ok(out)
    }
}

fn push_field(out: &mut AdvPayload, ad_type: u8, data: &[u8]) -> Result<(), BleError> {
    let len = u8::try_from(data.len() + 1).map_err(|_| BleError::PayloadTooLong)?;
    out.push(len).map_err(|_| BleError::PayloadTooLong)?;
    out.push(ad_type).map_err(|_| BleError::PayloadTooLong)?;
    out.extend_from_slice(data).map_err(|()| BleError::PayloadTooLong)
}
