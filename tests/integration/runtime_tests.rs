//! Duty-level behaviour: the full runtime is raced against a scripted
//! central, so every test ends when the script finishes (or earlier, on a
//! fatal duty error).

use core::future::Future;

use futures_lite::future;

use enviroble::adapters::sim::{self, SimAdvertiser, SimCentral, SimGattServer, SimLinkEvent, SimSensePin};
use enviroble::app::events::{RequestSource, RuntimeEvent};
use enviroble::app::ports::WaitError;
use enviroble::board::BoardModel;
use enviroble::codec::{self, Quantity};
use enviroble::config::RuntimeConfig;
use enviroble::error::{BleError, SensorError};
use enviroble::pump::PumpState;
use enviroble::runtime::blink::LIT_PERCENT;
use enviroble::runtime::{self, Duties, RuntimeContext};
use enviroble::Error;

use crate::mock_hw::{MockBoard, MockClock, RecordingLed, RecordingOutputs, RecordingSink, settle};

type Ctx = RuntimeContext<SimGattServer, RecordingSink, MockClock>;
type TestDuties = Duties<MockBoard, SimAdvertiser, RecordingLed, RecordingOutputs>;

const PEER: [u8; 6] = [0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03];

fn boot(model: BoardModel) -> Ctx {
    RuntimeContext::boot(
        RuntimeConfig::default(),
        &mut sim::bus_probe(model),
        &mut SimSensePin::for_model(model),
        SimGattServer::new(),
        RecordingSink::default(),
        MockClock::default(),
        &[7; 8],
    )
    .unwrap()
}

struct Rig {
    duties: TestDuties,
    central: SimCentral,
    led: RecordingLed,
    outputs: RecordingOutputs,
}

fn rig(model: BoardModel, board: MockBoard) -> Rig {
    let (advertiser, central) = sim::link();
    let led = RecordingLed::default();
    let outputs = RecordingOutputs::default();
    let duties = Duties {
        board,
        advertiser,
        led: led.clone(),
        pumps: (model == BoardModel::Grow).then(|| outputs.clone()),
    };
    Rig { duties, central, led, outputs }
}

/// Run every duty until `script` completes or a duty fails.
fn drive(ctx: &Ctx, duties: TestDuties, script: impl Future<Output = ()>) -> Result<(), Error> {
    future::block_on(future::or(
        async {
            match runtime::run(ctx, duties).await {
                Ok(never) => match never {},
                Err(e) => Err(e),
            }
        },
        async {
            script.await;
            Ok(())
        },
    ))
}

fn count(ctx: &Ctx, pred: impl Fn(&RuntimeEvent) -> bool) -> usize {
    ctx.events().count(pred)
}

// ── Sensor duty ───────────────────────────────────────────────

#[test]
fn sensor_duty_publishes_encoded_readings() {
    let ctx = boot(BoardModel::Weather);
    let Rig { duties, .. } = rig(BoardModel::Weather, MockBoard::new(BoardModel::Weather));

    drive(&ctx, duties, settle(5)).unwrap();

    let server = ctx.server();
    for binding in ctx.gatt().sensor_bindings() {
        let expected = match binding.quantity {
            Quantity::Temperature => 2134i16,
            Quantity::Humidity => 4000,
            Quantity::Pressure => 10005,
            Quantity::RainRate => 3,
            Quantity::Luminance => 100,
        };
        let payload = server.value(binding.handle).unwrap();
        assert_eq!(payload, expected.to_le_bytes(), "{}", binding.quantity);
        let decoded = codec::decode(binding.quantity, [payload[0], payload[1]]);
        assert!(decoded.is_finite());
    }
    assert!(count(&ctx, |e| matches!(e, RuntimeEvent::ReadingsPublished(_))) >= 1);
}

#[test]
fn acquisition_failure_ends_the_runtime() {
    let ctx = boot(BoardModel::Urban);
    let Rig { duties, .. } = rig(BoardModel::Urban, MockBoard::failing_from(BoardModel::Urban, 1));

    let result = drive(&ctx, duties, settle(1_000));
    assert_eq!(result, Err(Error::Sensor(SensorError::ReadFailed)));
    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::ReadingsPublished(_))), 1);
}

// ── Advertising duty ──────────────────────────────────────────

#[test]
fn cancellation_while_advertising_readvertises_once() {
    let ctx = boot(BoardModel::Weather);
    let Rig { duties, central, .. } = rig(BoardModel::Weather, MockBoard::new(BoardModel::Weather));

    let result = drive(&ctx, duties, async {
        settle(2).await;
        central.cancel().await;
        settle(10).await;
    });

    assert!(result.is_ok(), "cancellation must not be fatal");
    assert_eq!(central.advertise_count(), 2);
    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::Advertising)), 2);
    assert_eq!(
        count(&ctx, |e| matches!(e, RuntimeEvent::WaitAborted(WaitError::Cancelled))),
        1
    );
}

#[test]
fn cancellation_during_connection_restarts_advertising() {
    let ctx = boot(BoardModel::Indoor);
    let Rig { duties, central, .. } = rig(BoardModel::Indoor, MockBoard::new(BoardModel::Indoor));

    drive(&ctx, duties, async {
        central.connect(PEER).await;
        settle(3).await;
        central.cancel().await;
        settle(10).await;
    })
    .unwrap();

    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::Connected(p) if *p == PEER)), 1);
    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::WaitAborted(_))), 1);
    assert_eq!(central.advertise_count(), 2);
}

#[test]
fn no_advertising_while_connected() {
    let ctx = boot(BoardModel::Urban);
    let Rig { duties, central, .. } = rig(BoardModel::Urban, MockBoard::new(BoardModel::Urban));

    drive(&ctx, duties, async {
        central.connect(PEER).await;
        settle(10).await;
        assert_eq!(central.advertise_count(), 1);
        central.disconnect().await;
        settle(10).await;
    })
    .unwrap();

    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::Disconnected)), 1);
    assert_eq!(central.advertise_count(), 2);
}

#[test]
fn timeout_is_absorbed() {
    let ctx = boot(BoardModel::Urban);
    let Rig { duties, central, .. } = rig(BoardModel::Urban, MockBoard::new(BoardModel::Urban));

    drive(&ctx, duties, async {
        central.send(SimLinkEvent::TimeOut).await;
        settle(10).await;
    })
    .unwrap();
    assert_eq!(
        count(&ctx, |e| matches!(e, RuntimeEvent::WaitAborted(WaitError::TimedOut))),
        1
    );
}

#[test]
fn stack_failure_is_fatal() {
    let ctx = boot(BoardModel::Weather);
    let Rig { duties, central, .. } = rig(BoardModel::Weather, MockBoard::new(BoardModel::Weather));

    let result = drive(&ctx, duties, async {
        central.send(SimLinkEvent::StackFailure(-7)).await;
        settle(1_000).await;
    });
    assert_eq!(result, Err(Error::Ble(BleError::StackFailure(-7))));
}

// ── Pump automation ───────────────────────────────────────────

#[test]
fn central_write_applies_pump_once() {
    let ctx = boot(BoardModel::Grow);
    let Rig { duties, central, outputs, .. } = rig(BoardModel::Grow, MockBoard::new(BoardModel::Grow));
    let pump = ctx.gatt().pump_handles()[0];

    drive(&ctx, duties, async {
        central.connect(PEER).await;
        central.write(pump, &[0x01]).await;
        settle(20).await;
    })
    .unwrap();

    let channel = ctx.pumps().unwrap().channel(0).unwrap();
    assert_eq!(channel.current(), PumpState::On);
    assert!(!channel.has_pending());
    assert_eq!(*outputs.0.borrow(), vec![(0, PumpState::On)]);
    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::PumpChanged { .. })), 1);
    assert_eq!(
        count(&ctx, |e| matches!(
            e,
            RuntimeEvent::PumpRequested { channel: 0, state: PumpState::On, source: RequestSource::Central }
        )),
        1
    );
    assert_eq!(ctx.server().value(pump), Some(&[0x01][..]));
}

#[test]
fn concurrent_requests_keep_last_value_per_channel() {
    let ctx = boot(BoardModel::Grow);
    let Rig { duties, central, outputs, .. } = rig(BoardModel::Grow, MockBoard::new(BoardModel::Grow));
    let pumps = ctx.gatt().pump_handles().to_vec();

    drive(&ctx, duties, async {
        central.connect(PEER).await;
        central.write(pumps[0], &[0x01]).await;
        central.write(pumps[1], &[0x01]).await;
        central.write(pumps[0], &[0x00]).await;
        central.write(pumps[2], &[0x01]).await;
        central.write(pumps[0], &[0x01]).await;
        central.write(pumps[2], &[0x00]).await;
        settle(20).await;
    })
    .unwrap();

    assert_eq!(*outputs.0.borrow(), vec![(0, PumpState::On), (1, PumpState::On)]);
    let bank = ctx.pumps().unwrap();
    assert_eq!(bank.channel(2).unwrap().current(), PumpState::Off);
    assert!(!bank.channel(2).unwrap().has_pending());
    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::PumpChanged { .. })), 2);
}

#[test]
fn malformed_write_is_ignored() {
    let ctx = boot(BoardModel::Grow);
    let Rig { duties, central, outputs, .. } = rig(BoardModel::Grow, MockBoard::new(BoardModel::Grow));
    let pump = ctx.gatt().pump_handles()[1];

    drive(&ctx, duties, async {
        central.connect(PEER).await;
        central.write(pump, &[0x7F]).await;
        settle(10).await;
    })
    .unwrap();

    assert!(outputs.0.borrow().is_empty());
    assert_eq!(count(&ctx, |e| matches!(e, RuntimeEvent::InvalidWrite { .. })), 1);
}

#[test]
fn grow_board_requires_pump_outputs() {
    let ctx = boot(BoardModel::Grow);
    let Rig { mut duties, .. } = rig(BoardModel::Grow, MockBoard::new(BoardModel::Grow));
    duties.pumps = None;

    let result = drive(&ctx, duties, settle(100));
    assert!(matches!(result, Err(Error::Init(_))));
}

// ── Blink duty ────────────────────────────────────────────────

#[test]
fn blink_alternates_full_and_off() {
    let ctx = boot(BoardModel::Urban);
    let Rig { duties, led, .. } = rig(BoardModel::Urban, MockBoard::new(BoardModel::Urban));

    drive(&ctx, duties, settle(8)).unwrap();

    let history = led.0.borrow();
    assert!(history.len() >= 4);
    assert_eq!(&history[..4], &[100, 0, 100, 0]);
    assert!(history.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn pulse_breathes_then_stop_goes_dark() {
    let ctx = boot(BoardModel::Weather);
    let Rig { duties, led, .. } = rig(BoardModel::Weather, MockBoard::new(BoardModel::Weather));

    drive(&ctx, duties, async {
        settle(2).await;
        ctx.pulse_activity_led(1.0).unwrap();
        settle(40).await;
        ctx.stop_activity_led();
        settle(10).await;
    })
    .unwrap();

    let history = led.0.borrow();
    let pulse: Vec<u8> = history
        .iter()
        .copied()
        .skip_while(|&b| b == LIT_PERCENT || b == 0)
        .take_while(|&b| b != 0)
        .collect();
    assert!(pulse.len() >= 20, "{history:?}");
    assert!(pulse.iter().all(|b| (20..=100).contains(b)), "{pulse:?}");
    assert!(pulse.contains(&100) && pulse.contains(&20), "{pulse:?}");

    assert_eq!(history.last(), Some(&0));
    assert_eq!(history.iter().rev().take_while(|&&b| b == 0).count(), 1, "off is written once");
}
