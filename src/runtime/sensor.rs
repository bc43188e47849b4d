//! Sensor duty: read, encode, publish, sleep.
//!
//! A cycle is all-or-nothing. Every registered quantity is encoded before
//! any characteristic is written, so an acquisition or encoding failure
//! leaves the previous cycle's payloads in place and ends the runtime.

use core::convert::Infallible;
use core::time::Duration;

use crate::app::events::{RequestSource, RuntimeEvent};
use crate::app::ports::{BoardDriver, Clock, EventSink, GattServer};
use crate::ble::gatt::CharacteristicHandle;
use crate::codec::{self, Payload};
use crate::error::{Result, SensorError};
use crate::pump::moisture_targets;
use crate::readings::{MOISTURE_CHANNELS, Readings};

use super::RuntimeContext;

pub async fn run<G, E, C, B>(ctx: &RuntimeContext<G, E, C>, board: &mut B) -> Result<Infallible>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    B: BoardDriver,
{
    let interval = Duration::from_secs(u64::from(ctx.config().sensor_interval_secs));
    let mut last_ms = ctx.clock().now_ms();
    loop {
        last_ms = cycle(ctx, board, last_ms)?;
        ctx.clock().sleep(interval).await;
    }
}

/// One iteration body. Returns the timestamp of this acquisition.
pub(crate) fn cycle<G, E, C, B>(ctx: &RuntimeContext<G, E, C>, board: &mut B, last_ms: u64) -> Result<u64>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    B: BoardDriver,
{
    let elapsed_secs = ctx.clock().now_ms().saturating_sub(last_ms) as f32 / 1000.0;
    let readings = board.read_sensors(elapsed_secs)?;
    let taken_ms = ctx.clock().now_ms();

    let payloads = encode_all(ctx, &readings)?;
    for (handle, payload) in &payloads {
        ctx.write_characteristic(*handle, payload)?;
    }

    let moisture = readings.moisture();
    ctx.emit(RuntimeEvent::ReadingsPublished(readings));

    if ctx.config().moisture.enabled {
        request_watering(ctx, &moisture)?;
    }
    Ok(taken_ms)
}

fn encode_all<G, E, C>(ctx: &RuntimeContext<G, E, C>, readings: &Readings) -> Result<Vec<(CharacteristicHandle, Payload)>>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
{
    let bindings = ctx.gatt().sensor_bindings();
    let mut payloads = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let value = readings
            .get(binding.quantity)
            .ok_or(SensorError::MissingQuantity(binding.quantity))?;
        payloads.push((binding.handle, codec::encode(binding.quantity, value)?));
    }
    Ok(payloads)
}

/// Feed the moisture rule into the pump bank. Only targets that differ
/// from the applied output are requested.
fn request_watering<G, E, C>(ctx: &RuntimeContext<G, E, C>, levels: &[Option<f32>; MOISTURE_CHANNELS]) -> Result<()>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
{
    let Some(bank) = ctx.pumps() else {
        return Ok(());
    };
    for (channel, target) in moisture_targets(levels, &ctx.config().moisture).into_iter().enumerate() {
        let Some(state) = target else { continue };
        if bank.channel(channel).is_some_and(|ch| ch.current() == state) {
            continue;
        }
        bank.request(channel, state)?;
        ctx.emit(RuntimeEvent::PumpRequested {
            channel,
            state,
            source: RequestSource::Moisture,
        });
    }
    Ok(())
}
