//! Automation duty (grow only): apply pending pump requests once per tick.
//!
//! This is the only writer of each channel's applied state. Every
//! transition is reported exactly once: a `PumpChanged` event and the new
//! byte on the channel's Digital characteristic.

use core::convert::Infallible;
use core::time::Duration;

use futures_lite::future;
use log::debug;

use crate::app::events::RuntimeEvent;
use crate::app::ports::{Clock, EventSink, GattServer, PumpOutputs};
use crate::error::{Error, Result};
use crate::pump::PumpBank;

use super::RuntimeContext;

/// On boards without pumps this parks forever so the duty join is
/// uniform across models.
pub async fn run<G, E, C, P>(ctx: &RuntimeContext<G, E, C>, outputs: Option<&mut P>) -> Result<Infallible>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    P: PumpOutputs,
{
    let Some(bank) = ctx.pumps() else {
        debug!("automation: no actuators on '{}', parked", ctx.model());
        return future::pending().await;
    };
    let outputs = outputs.ok_or(Error::Init("pump outputs missing on a board with actuators"))?;

    let period = Duration::from_millis(u64::from(ctx.config().automation_interval_ms));
    loop {
        tick(ctx, bank, outputs)?;
        ctx.clock().sleep(period).await;
    }
}

/// Apply and report. A channel with nothing pending does nothing.
pub(crate) fn tick<G, E, C, P>(ctx: &RuntimeContext<G, E, C>, bank: &PumpBank, outputs: &mut P) -> Result<()>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    P: PumpOutputs,
{
    for transition in bank.apply_pending(outputs)? {
        if let Some(&handle) = ctx.gatt().pump_handles().get(transition.channel) {
            ctx.write_characteristic(handle, &[transition.state.to_digital()])?;
        }
        ctx.emit(RuntimeEvent::PumpChanged {
            channel: transition.channel,
            state: transition.state,
        });
    }
    Ok(())
}
