//! Advertising duty: one central at a time, serially.
//!
//! ```text
//!   ┌──▶ Advertising ──connect──▶ Connected ──disconnect──┐
//!   │        │                        │                    │
//!   │   cancel/timeout          cancel/timeout             │
//!   └────────┴────────────────────────┴────────────────────┘
//! ```
//!
//! Cancellation and timeout are logged and absorbed; the duty re-enters
//! advertising. A stack failure is fatal. Writes from the connected
//! central are routed here, which is how pump requests reach the bank
//! without any duty holding a reference to the connection.

use core::convert::Infallible;

use crate::app::events::{RequestSource, RuntimeEvent};
use crate::app::ports::{Advertiser, Clock, Connection, ConnectionEvent, EventSink, GattServer, WaitError};
use crate::ble::gatt::CharacteristicHandle;
use crate::error::{BleError, Result};
use crate::pump::PumpState;

use super::RuntimeContext;

pub async fn run<G, E, C, A>(ctx: &RuntimeContext<G, E, C>, advertiser: &mut A) -> Result<Infallible>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    A: Advertiser,
{
    loop {
        ctx.emit(RuntimeEvent::Advertising);
        let mut connection = match advertiser.advertise(ctx.advertising()).await {
            Ok(connection) => connection,
            Err(e) => {
                absorb(ctx, e)?;
                continue;
            }
        };

        ctx.emit(RuntimeEvent::Connected(connection.peer()));
        serve(ctx, &mut connection).await?;
    }
}

/// Handle one central's events until the link ends.
async fn serve<G, E, C, N>(ctx: &RuntimeContext<G, E, C>, connection: &mut N) -> Result<()>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    N: Connection,
{
    loop {
        match connection.next_event().await {
            Ok(ConnectionEvent::Write { handle, value }) => route_write(ctx, handle, &value)?,
            Ok(ConnectionEvent::Disconnected) => {
                ctx.emit(RuntimeEvent::Disconnected);
                return Ok(());
            }
            Err(e) => return absorb(ctx, e),
        }
    }
}

fn absorb<G, E, C>(ctx: &RuntimeContext<G, E, C>, error: WaitError) -> Result<()>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
{
    match error {
        WaitError::Stack(rc) => Err(BleError::StackFailure(rc).into()),
        WaitError::Cancelled | WaitError::TimedOut => {
            ctx.emit(RuntimeEvent::WaitAborted(error));
            Ok(())
        }
    }
}

/// Turn a central's Digital write into a pump request.
pub(crate) fn route_write<G, E, C>(ctx: &RuntimeContext<G, E, C>, handle: CharacteristicHandle, value: &[u8]) -> Result<()>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
{
    let request = ctx.gatt().pump_channel(handle).zip(PumpState::from_digital(value));
    let (Some(bank), Some((channel, state))) = (ctx.pumps(), request) else {
        ctx.emit(RuntimeEvent::InvalidWrite { handle: handle.0 });
        return Ok(());
    };
    bank.request(channel, state)?;
    ctx.emit(RuntimeEvent::PumpRequested {
        channel,
        state,
        source: RequestSource::Central,
    });
    Ok(())
}
