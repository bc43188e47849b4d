//! Activity LED duty.
//!
//! ```text
//!  Blink            100 ─ 0 ─ 100 ─ 0     every blink_interval_ms
//!  Pulse { hz }     sin(2π·phase)·40 + 60 every 50 ms (20..=100 %)
//!  Off              0, written once
//! ```
//!
//! The mode lives in the [`RuntimeContext`] and may be switched by any
//! duty or the host at any time; the LED itself and the pulse phase are
//! owned by this duty alone. A switch takes effect at the next iteration.

use core::convert::Infallible;
use core::f32::consts::TAU;
use core::time::Duration;

use crate::app::ports::{Clock, EventSink, GattServer, IndicatorLed};
use crate::error::Result;

use super::RuntimeContext;

pub const LIT_PERCENT: u8 = 100;

/// Pulse animation frame period.
pub const PULSE_TICK_MS: u64 = 50;

const PULSE_MID: f32 = 60.0;
const PULSE_SWING: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ActivityMode {
    /// Full / off square wave.
    #[default]
    Blink,
    /// Sinusoidal breathing at `speed_hz` cycles per second.
    Pulse { speed_hz: f32 },
    /// Dark until another mode is selected.
    Off,
}

/// Phase accumulator for the pulse animation, in cycles (`0.0..1.0`).
#[derive(Debug, Default)]
pub struct Pulse {
    phase: f32,
}

impl Pulse {
    /// Linear brightness for the current phase.
    pub fn brightness(&self) -> u8 {
        let level = (self.phase * TAU).sin() * PULSE_SWING + PULSE_MID;
        level.round().clamp(0.0, 100.0) as u8
    }

    pub fn advance(&mut self, speed_hz: f32, elapsed: Duration) {
        self.phase = (self.phase + speed_hz * elapsed.as_secs_f32()).fract();
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

pub async fn run<G, E, C, L>(ctx: &RuntimeContext<G, E, C>, led: &mut L) -> Result<Infallible>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    L: IndicatorLed,
{
    let blink_period = Duration::from_millis(u64::from(ctx.config().blink_interval_ms));
    let pulse_tick = Duration::from_millis(PULSE_TICK_MS);

    let mut lit = true;
    let mut dark = false;
    let mut pulse = Pulse::default();
    loop {
        let period = match ctx.activity_mode() {
            ActivityMode::Blink => {
                led.set_brightness(if lit { LIT_PERCENT } else { 0 })?;
                lit = !lit;
                dark = false;
                blink_period
            }
            ActivityMode::Pulse { speed_hz } => {
                led.set_brightness(pulse.brightness())?;
                pulse.advance(speed_hz, pulse_tick);
                dark = false;
                pulse_tick
            }
            ActivityMode::Off => {
                if !dark {
                    led.set_brightness(0)?;
                    dark = true;
                }
                blink_period
            }
        };
        ctx.clock().sleep(period).await;
    }
}
