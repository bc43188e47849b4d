//! Pump output driver (grow board).
//!
//! Three digital outputs, one per pump MOSFET. HIGH = pump running.
//! This driver is a dumb actuator: when to switch is decided by the
//! automation duty.

use embedded_hal::digital::OutputPin;

use crate::app::ports::PumpOutputs;
use crate::board::PUMP_CHANNELS;
use crate::error::ActuatorError;
use crate::pump::PumpState;

pub struct GpioPumpOutputs<P> {
    pins: [P; PUMP_CHANNELS],
}

impl<P: OutputPin> GpioPumpOutputs<P> {
    /// Take the pins and drive every pump off.
    pub fn new(mut pins: [P; PUMP_CHANNELS]) -> Result<Self, ActuatorError> {
        for (i, pin) in pins.iter_mut().enumerate() {
            pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed(i as u8))?;
        }
        Ok(Self { pins })
    }

    pub fn release(self) -> [P; PUMP_CHANNELS] {
        self.pins
    }
}

impl<P: OutputPin> PumpOutputs for GpioPumpOutputs<P> {
    fn set_output(&mut self, channel: usize, state: PumpState) -> Result<(), ActuatorError> {
        let pin = self
            .pins
            .get_mut(channel)
            .ok_or(ActuatorError::NoSuchChannel(channel as u8))?;
        let written = match state {
            PumpState::On => pin.set_high(),
            PumpState::Off => pin.set_low(),
        };
        written.map_err(|_| ActuatorError::GpioWriteFailed(channel as u8))
    }
}
