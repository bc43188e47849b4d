//! I²C bus probe used for board detection.
//!
//! A device is present when a one-byte read at its address is
//! acknowledged. Any error (NACK, arbitration loss) counts as absent.

use embedded_hal::i2c::I2c;

use crate::app::ports::{BusDevices, BusProbe};
use crate::error::SensorError;
use crate::pins::{I2C_SCAN_FIRST, I2C_SCAN_LAST};

pub struct I2cBusProbe<I> {
    bus: I,
}

impl<I: I2c> I2cBusProbe<I> {
    pub fn new(bus: I) -> Self {
        Self { bus }
    }

    /// Hand the bus back to the sensor drivers.
    pub fn release(self) -> I {
        self.bus
    }
}

impl<I: I2c> BusProbe for I2cBusProbe<I> {
    fn scan(&mut self) -> Result<BusDevices, SensorError> {
        let mut found = BusDevices::new();
        let mut byte = [0u8; 1];
        for addr in I2C_SCAN_FIRST..=I2C_SCAN_LAST {
            if self.bus.read(addr, &mut byte).is_ok() {
                found.push(addr).map_err(|_| SensorError::BusFault)?;
            }
        }
        Ok(found)
    }
}
