//! Activity LED driver.
//!
//! One PWM channel behind the on-board activity LED. Brightness is
//! specified linearly (0–100 %) and gamma-corrected (γ = 2.8) onto a
//! 16-bit duty before it reaches the PWM peripheral.

use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::IndicatorLed;
use crate::error::ActuatorError;

const GAMMA: f32 = 2.8;

/// Gamma-corrected 16-bit duty for a linear brightness percentage.
pub fn gamma_duty(percent: u8) -> u16 {
    let linear = f32::from(percent.min(100)) / 100.0;
    (linear.powf(GAMMA) * 65535.0 + 0.5) as u16
}

pub struct PwmActivityLed<P> {
    pwm: P,
    brightness: u8,
}

impl<P: SetDutyCycle> PwmActivityLed<P> {
    /// Take the PWM channel and switch the LED off.
    pub fn new(mut pwm: P) -> Result<Self, ActuatorError> {
        pwm.set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        Ok(Self { pwm, brightness: 0 })
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Give the PWM channel back.
    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> IndicatorLed for PwmActivityLed<P> {
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError> {
        let percent = percent.min(100);
        self.pwm
            .set_duty_cycle_fraction(gamma_duty(percent), u16::MAX)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.brightness = percent;
        Ok(())
    }
}
