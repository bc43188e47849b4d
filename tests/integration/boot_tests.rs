//! Boot sequence: detection → capabilities → one-shot GATT publication.

use enviroble::adapters::sim::SimGattServer;
use enviroble::app::events::RuntimeEvent;
use enviroble::ble::gatt::{CHAR_DIGITAL, CHAR_MODEL_NUMBER, DIGITAL_OFF};
use enviroble::board::BoardModel;
use enviroble::codec::Quantity;
use enviroble::config::RuntimeConfig;
use enviroble::pins::{INDOOR_LIGHT_SENSOR_ADDR, LTR559_ADDR};
use enviroble::runtime::RuntimeContext;
use enviroble::Error;

use crate::mock_hw::{MockBus, MockClock, MockSensePin, RecordingSink};

type Ctx = RuntimeContext<SimGattServer, RecordingSink, MockClock>;

fn boot(bus: Vec<u8>, sense_high: bool) -> (Result<Ctx, Error>, MockSensePin) {
    let mut sense = MockSensePin::new(sense_high);
    let ctx = RuntimeContext::boot(
        RuntimeConfig::default(),
        &mut MockBus(bus),
        &mut sense,
        SimGattServer::new(),
        RecordingSink::default(),
        MockClock::default(),
        &[0x11; 8],
    );
    (ctx, sense)
}

#[test]
fn weather_board_end_to_end() {
    let (ctx, sense) = boot(vec![LTR559_ADDR, 0x76], true);
    let ctx = ctx.unwrap();

    assert_eq!(ctx.model(), BoardModel::Weather);
    assert_eq!(sense.samples, 1);
    assert!(!sense.pulled, "sense pin released after sampling");

    let caps = ctx.capabilities();
    assert!(caps.has(Quantity::RainRate));
    assert!(caps.has(Quantity::Luminance));
    assert!(!caps.has_actuators());
    assert!(ctx.pumps().is_none());

    let order: Vec<Quantity> = ctx.gatt().sensor_bindings().iter().map(|b| b.quantity).collect();
    assert_eq!(
        order,
        [
            Quantity::Temperature,
            Quantity::Humidity,
            Quantity::Pressure,
            Quantity::RainRate,
            Quantity::Luminance,
        ]
    );

    // 5 sensor + 5 device information characteristics.
    assert_eq!(ctx.server().characteristic_count(), 10);
    assert_eq!(ctx.server().value_by_uuid(CHAR_MODEL_NUMBER), Some(&b"weather"[..]));
    assert!(matches!(
        ctx.events().events.as_slice(),
        [RuntimeEvent::Booted { model: BoardModel::Weather, characteristics: 5 }]
    ));
}

#[test]
fn grow_board_gets_pumps_and_automation_io() {
    let (ctx, _) = boot(vec![LTR559_ADDR], false);
    let ctx = ctx.unwrap();

    assert_eq!(ctx.model(), BoardModel::Grow);
    let bank = ctx.pumps().unwrap();
    assert_eq!(bank.len(), 3);
    assert_eq!(ctx.gatt().pump_handles().len(), 3);
    for &handle in ctx.gatt().pump_handles() {
        assert_eq!(ctx.server().value(handle), Some(&[DIGITAL_OFF][..]));
    }
    assert_eq!(ctx.server().value_by_uuid(CHAR_DIGITAL), Some(&[DIGITAL_OFF][..]));
}

#[test]
fn indoor_board_never_touches_sense_pin() {
    let mut sense = MockSensePin::new(false);
    let ctx: Ctx = RuntimeContext::boot(
        RuntimeConfig::default(),
        &mut MockBus(vec![INDOOR_LIGHT_SENSOR_ADDR, LTR559_ADDR]),
        &mut sense,
        SimGattServer::new(),
        RecordingSink::default(),
        MockClock::default(),
        &[0; 8],
    )
    .unwrap();
    assert_eq!(ctx.model(), BoardModel::Indoor);
    assert_eq!(sense.samples, 0, "indoor detection samples GPIO 12");
    assert!(!sense.pulled);
}

#[test]
fn empty_bus_is_urban() {
    let (ctx, _) = boot(vec![], true);
    let ctx = ctx.unwrap();
    assert_eq!(ctx.model(), BoardModel::Urban);
    assert_eq!(ctx.gatt().sensor_bindings().len(), 3);
}

#[test]
fn advertising_parameters_follow_model() {
    let (ctx, _) = boot(vec![LTR559_ADDR], false);
    let adv = ctx.unwrap().advertising().clone();
    assert_eq!(adv.name.as_str(), "enviro-grow");
    assert_eq!(adv.interval_us, 250_000);
    assert_eq!(adv.interval_units(), 400);
    assert!(adv.payload().unwrap().len() <= 31);
}
