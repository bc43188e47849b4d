//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured runtime events through
//! the `log` facade (stderr on the host, the platform logger on silicon).
//! A telemetry forwarder would implement the same trait.

use log::{info, warn};

use crate::app::events::RuntimeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`RuntimeEvent`] as one tagged line.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &RuntimeEvent) {
        match event {
            RuntimeEvent::Booted { model, characteristics } => {
                info!("BOOT | model={model} | sensor_chars={characteristics}");
            }
            RuntimeEvent::ReadingsPublished(r) => {
                let mut line = heapless::String::<160>::new();
                for (quantity, value) in r.iter() {
                    let _ = core::fmt::write(&mut line, format_args!("{quantity}={value:.2} "));
                }
                for (ch, level) in r.moisture().iter().enumerate() {
                    if let Some(level) = level {
                        let _ = core::fmt::write(&mut line, format_args!("moisture{ch}={level:.0}% "));
                    }
                }
                info!("READ | {}", line.trim_end());
            }
            RuntimeEvent::Advertising => {
                info!("BLE  | advertising");
            }
            RuntimeEvent::Connected(peer) => {
                info!(
                    "BLE  | connected {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                    peer[0], peer[1], peer[2], peer[3], peer[4], peer[5]
                );
            }
            RuntimeEvent::Disconnected => {
                info!("BLE  | disconnected");
            }
            RuntimeEvent::WaitAborted(reason) => {
                warn!("BLE  | wait aborted ({reason:?}), re-advertising");
            }
            RuntimeEvent::InvalidWrite { handle } => {
                warn!("BLE  | ignored write to handle {handle}");
            }
            RuntimeEvent::PumpRequested { channel, state, source } => {
                info!("PUMP | ch{channel} requested {state:?} by {source:?}");
            }
            RuntimeEvent::PumpChanged { channel, state } => {
                info!("PUMP | ch{channel} -> {state:?}");
            }
        }
    }
}
