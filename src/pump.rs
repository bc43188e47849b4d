//! Pump channel state machines (grow board).
//!
//! Each channel is `{Off, On} × pending ∈ {None, Off, On}`. Requests may
//! arrive at any time from the BLE write path or the moisture rule; they
//! only ever replace `pending`. The automation duty is the single place
//! where `pending` is applied to the physical output, so concurrent
//! request sources can never tear a GPIO write.
//!
//! ## Single-threaded contract
//!
//! `PumpBank` uses `Cell` and a `NoopRawMutex` signal. It must only be
//! touched from duties polled on the runtime's executor. A stack callback
//! on another thread has to go through the `Connection` port.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use log::debug;

use crate::app::ports::PumpOutputs;
use crate::board::PUMP_CHANNELS;
use crate::ble::gatt::{DIGITAL_OFF, DIGITAL_ON};
use crate::config::MoistureConfig;
use crate::error::{ActuatorError, Result};
use crate::readings::MOISTURE_CHANNELS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PumpState {
    #[default]
    Off,
    On,
}

impl PumpState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// Digital characteristic byte.
    pub fn to_digital(self) -> u8 {
        match self {
            Self::Off => DIGITAL_OFF,
            Self::On => DIGITAL_ON,
        }
    }

    /// Parse a central's write. Only a single 0x00 / 0x01 byte is accepted.
    pub fn from_digital(value: &[u8]) -> Option<Self> {
        match value {
            [DIGITAL_OFF] => Some(Self::Off),
            [DIGITAL_ON] => Some(Self::On),
            _ => None,
        }
    }
}

impl From<bool> for PumpState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// One pump: applied output plus the latest unapplied request.
pub struct PumpChannel {
    current: Cell<PumpState>,
    pending: Signal<NoopRawMutex, PumpState>,
}

impl Default for PumpChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpChannel {
    pub fn new() -> Self {
        Self {
            current: Cell::new(PumpState::Off),
            pending: Signal::new(),
        }
    }

    pub fn current(&self) -> PumpState {
        self.current.get()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.signaled()
    }

    /// Replace the pending target. The last request before a tick wins.
    pub fn request(&self, target: PumpState) {
        self.pending.signal(target);
    }

    /// Take and clear the pending target. Returns the new state when the
    /// output actually has to change.
    fn take_transition(&self) -> Option<PumpState> {
        let target = self.pending.try_take()?;
        (target != self.current.get()).then_some(target)
    }
}

/// A state transition applied during one automation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub channel: usize,
    pub state: PumpState,
}

/// All pump channels of a board.
pub struct PumpBank {
    channels: [PumpChannel; PUMP_CHANNELS],
}

impl Default for PumpBank {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpBank {
    pub fn new() -> Self {
        Self {
            channels: core::array::from_fn(|_| PumpChannel::new()),
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&PumpChannel> {
        self.channels.get(channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn request(&self, channel: usize, target: PumpState) -> Result<()> {
        let ch = self
            .channels
            .get(channel)
            .ok_or(ActuatorError::NoSuchChannel(channel as u8))?;
        ch.request(target);
        Ok(())
    }

    /// Apply every pending change to the outputs.
    ///
    /// Called from the automation duty only. A failed output write is
    /// returned immediately; the channel keeps its previous `current`.
    pub fn apply_pending<P: PumpOutputs>(
        &self,
        outputs: &mut P,
    ) -> Result<heapless::Vec<Transition, PUMP_CHANNELS>> {
        let mut applied = heapless::Vec::new();
        for (index, ch) in self.channels.iter().enumerate() {
            let Some(state) = ch.take_transition() else {
                continue;
            };
            outputs.set_output(index, state)?;
            ch.current.set(state);
            debug!("pump[{index}]: output -> {state:?}");
            // One entry per channel, so capacity is never exceeded.
            let _ = applied.push(Transition { channel: index, state });
        }
        Ok(applied)
    }
}

// ---------------------------------------------------------------------------
// Moisture rule
// ---------------------------------------------------------------------------

/// Targets implied by one cycle's moisture levels.
///
/// Dry (below target) requests On; wet (above target + hysteresis)
/// requests Off; anything in between, or a missing level, requests
/// nothing.
pub fn moisture_targets(
    levels: &[Option<f32>; MOISTURE_CHANNELS],
    config: &MoistureConfig,
) -> [Option<PumpState>; MOISTURE_CHANNELS] {
    core::array::from_fn(|i| {
        let level = levels[i]?;
        let target = config.targets_percent[i];
        if level < target {
            Some(PumpState::On)
        } else if level > target + config.hysteresis_percent {
            Some(PumpState::Off)
        } else {
            None
        }
    })
}
