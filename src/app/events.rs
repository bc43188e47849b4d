//! Outbound runtime events.
//!
//! Duties emit these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them: log to
//! the console, record them in a test, forward them elsewhere.

use crate::app::ports::{PeerAddress, WaitError};
use crate::board::BoardModel;
use crate::pump::PumpState;
use crate::readings::Readings;

/// Where a pump request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    /// A central wrote the channel's Digital characteristic.
    Central,
    /// The moisture rule after a reading cycle.
    Moisture,
}

/// Structured events emitted by the runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Boot finished; carries the detected model and number of
    /// registered sensor characteristics.
    Booted { model: BoardModel, characteristics: usize },

    /// A full reading set was encoded and written.
    ReadingsPublished(Readings),

    /// Advertising (re)started.
    Advertising,

    /// A central connected.
    Connected(PeerAddress),

    /// The central disconnected.
    Disconnected,

    /// A wait on the stack ended without a connection or disconnect.
    WaitAborted(WaitError),

    /// A central wrote a payload that could not be interpreted.
    InvalidWrite { handle: u16 },

    /// A pump target was requested (not yet applied).
    PumpRequested { channel: usize, state: PumpState, source: RequestSource },

    /// A pump output changed. Emitted exactly once per transition.
    PumpChanged { channel: usize, state: PumpState },
}
