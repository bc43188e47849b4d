//! enviroble host simulation entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  I2cBusProbe         SimBoard       SimGattServer  SimAdvert │
//! │  (BusProbe)          (BoardDriver)  (GattServer)   (GAP)     │
//! │  SimSensePin                                                 │
//! │  (SensePin)                                                  │
//! │  PwmActivityLed      GpioPumpOutputs LogEventSink  Reactor   │
//! │  (IndicatorLed)      (PumpOutputs)   (EventSink)   (Clock)   │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ RuntimeContext · sensor · advertising · blink · pumps  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  edge_executor::LocalExecutor + async-io-mini timers         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `enviroble [indoor|weather|grow|urban]` (default `weather`).
//! `ENVIROBLE_CONFIG` may hold a JSON `RuntimeConfig` override and
//! `RUST_LOG` an `EnvFilter` directive string (default `info`). A scripted
//! central connects (the LED pulses meanwhile), toggles a pump on grow
//! boards, disconnects and finally cancels advertising once.
#![deny(unused_must_use)]

use core::time::Duration;

use anyhow::Result;
use edge_executor::LocalExecutor;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use enviroble::adapters::device_id;
use enviroble::adapters::log_sink::LogEventSink;
use enviroble::adapters::sim::{self, SimBoard, SimCentral, SimGattServer, SimPin, SimPwm, SimSensePin};
use enviroble::adapters::time::ReactorClock;
use enviroble::app::ports::Clock;
use enviroble::ble::gatt::{DIGITAL_OFF, DIGITAL_ON};
use enviroble::board::BoardModel;
use enviroble::config::RuntimeConfig;
use enviroble::drivers::activity_led::PwmActivityLed;
use enviroble::drivers::pump_outputs::GpioPumpOutputs;
use enviroble::pins;
use enviroble::runtime::{self, Duties, RuntimeContext};
use enviroble::Error;

type SimContext = RuntimeContext<SimGattServer, LogEventSink, ReactorClock>;

const PHONE: [u8; 6] = [0x4C, 0x57, 0xCA, 0x10, 0x20, 0x30];

/// Activity LED breathes while the phone is connected.
const CONNECTED_PULSE_HZ: f32 = 2.0;

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    info!("enviroble v{} (host simulation)", env!("CARGO_PKG_VERSION"));
    info!("power: holding VSYS_EN on GPIO{}", pins::HOLD_VSYS_EN_PIN);

    // ── 2. Configuration ──────────────────────────────────────
    let fitted: BoardModel = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => BoardModel::Weather,
    };
    let config = match std::env::var("ENVIROBLE_CONFIG") {
        Ok(json) => RuntimeConfig::from_json(&json)?,
        Err(_) => RuntimeConfig::default(),
    };

    // ── 3. Boot: detect, register, freeze ─────────────────────
    let ctx: SimContext = RuntimeContext::boot(
        config,
        &mut sim::bus_probe(fitted),
        &mut SimSensePin::for_model(fitted),
        SimGattServer::new(),
        LogEventSink::new(),
        ReactorClock::new(),
        &device_id::read_unique_id(),
    )?;

    // ── 4. Duty hardware ──────────────────────────────────────
    let (advertiser, central) = sim::link();
    let pumps = if ctx.capabilities().has_actuators() {
        Some(GpioPumpOutputs::new(SimPin::pump_bank()).map_err(Error::from)?)
    } else {
        None
    };
    let duties = Duties {
        board: SimBoard::new(ctx.model()),
        advertiser,
        led: PwmActivityLed::new(SimPwm::default()).map_err(Error::from)?,
        pumps,
    };

    // ── 5. Run ────────────────────────────────────────────────
    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    executor.spawn(central_script(&ctx, central)).detach();

    let never = futures_lite::future::block_on(executor.run(runtime::run(&ctx, duties)))?;
    match never {}
}

/// A phone that connects, pokes the first pump if there is one, leaves,
/// then cancels the next advertising wait. The LED pulses while it is
/// connected.
async fn central_script(ctx: &SimContext, central: SimCentral) {
    let clock = ctx.clock();
    clock.sleep(Duration::from_secs(3)).await;
    central.connect(PHONE).await;
    if let Err(e) = ctx.pulse_activity_led(CONNECTED_PULSE_HZ) {
        warn!("sim: {e}");
    }

    if let Some(&pump) = ctx.gatt().pump_handles().first() {
        clock.sleep(Duration::from_secs(2)).await;
        central.write(pump, &[DIGITAL_ON]).await;
        clock.sleep(Duration::from_secs(3)).await;
        central.write(pump, &[DIGITAL_OFF]).await;
    }

    clock.sleep(Duration::from_secs(5)).await;
    central.disconnect().await;
    ctx.blink_activity_led();
    clock.sleep(Duration::from_secs(2)).await;
    central.cancel().await;
    info!("sim: central script done (advertised {} times)", central.advertise_count());
}
