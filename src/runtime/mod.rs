//! Runtime context and the cooperative duty set.
//!
//! ```text
//!  boot ──▶ RuntimeContext ──┬──▶ sensor duty       (read, encode, write; 60 s)
//!                            ├──▶ advertising duty  (advertise, serve one central)
//!                            ├──▶ blink duty        (activity LED blink / pulse / off)
//!                            └──▶ automation duty   (apply pump requests; 1 s, grow only)
//! ```
//!
//! All duties are `async fn`s polled on one thread and share the context
//! by `&` reference. `RefCell` borrows are scoped to synchronous steps and
//! never held across an `.await`, so one duty's iteration body can never
//! interleave with another's. The duties are joined with `try_zip`: the
//! first fatal error ends the whole runtime.

pub mod advertising;
pub mod automation;
pub mod blink;
pub mod sensor;

use core::cell::{Cell, Ref, RefCell};
use core::convert::Infallible;

use futures_lite::future;
use log::{debug, error, info};

use crate::app::events::RuntimeEvent;
use crate::app::ports::{
    Advertiser, BoardDriver, BusProbe, Clock, EventSink, GattServer, IndicatorLed, PumpOutputs, SensePin,
};
use crate::ble::adv::AdvertisingParams;
use crate::ble::gatt::{CharacteristicHandle, DeviceInfo, GattRegistry, PublishedGatt, UniqueId};
use crate::board::{self, BoardModel, CapabilitySet};
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::pump::PumpBank;

use self::blink::ActivityMode;

/// Everything the duties share. Built once by [`RuntimeContext::boot`].
pub struct RuntimeContext<G, E, C> {
    model: BoardModel,
    capabilities: CapabilitySet,
    config: RuntimeConfig,
    gatt: PublishedGatt,
    advertising: AdvertisingParams,
    pumps: Option<PumpBank>,
    activity: Cell<ActivityMode>,
    server: RefCell<G>,
    events: RefCell<E>,
    clock: C,
}

impl<G, E, C> RuntimeContext<G, E, C>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
{
    /// Detect the board and publish its attribute table.
    ///
    /// Runs once, before any duty starts. After this returns the board
    /// model, capability set and GATT bindings are frozen.
    pub fn boot<B: BusProbe, S: SensePin>(
        config: RuntimeConfig,
        bus: &mut B,
        sense: &mut S,
        mut server: G,
        events: E,
        clock: C,
        unique_id: &UniqueId,
    ) -> Result<Self> {
        config.validate()?;

        let model = board::detect(bus, sense, config.detect_attempts)?;
        let capabilities = board::capabilities_for(model);
        let info = DeviceInfo::new(model, unique_id);
        info!("boot: serial {} ({})", info.serial, info.firmware);

        let gatt = GattRegistry::build(&capabilities, &info).publish(&mut server)?;
        let pumps = capabilities.has_actuators().then(PumpBank::new);
        let advertising = AdvertisingParams::for_model(model, config.adv_interval_us);

        let ctx = Self {
            model,
            capabilities,
            config,
            gatt,
            advertising,
            pumps,
            activity: Cell::new(ActivityMode::default()),
            server: RefCell::new(server),
            events: RefCell::new(events),
            clock,
        };
        ctx.emit(RuntimeEvent::Booted {
            model,
            characteristics: ctx.gatt.sensor_bindings().len(),
        });
        Ok(ctx)
    }

    pub fn model(&self) -> BoardModel {
        self.model
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn gatt(&self) -> &PublishedGatt {
        &self.gatt
    }

    pub fn advertising(&self) -> &AdvertisingParams {
        &self.advertising
    }

    /// Pump channels; `None` on boards without actuators.
    pub fn pumps(&self) -> Option<&PumpBank> {
        self.pumps.as_ref()
    }

    pub fn activity_mode(&self) -> ActivityMode {
        self.activity.get()
    }

    /// Breathe the activity LED at `speed_hz` until another mode is set.
    pub fn pulse_activity_led(&self, speed_hz: f32) -> Result<()> {
        if !speed_hz.is_finite() || speed_hz <= 0.0 {
            return Err(Error::Config("pulse speed must be a positive frequency"));
        }
        debug!("activity: pulse at {speed_hz} Hz");
        self.activity.set(ActivityMode::Pulse { speed_hz });
        Ok(())
    }

    /// Back to the default full / off square wave.
    pub fn blink_activity_led(&self) {
        debug!("activity: blink");
        self.activity.set(ActivityMode::Blink);
    }

    /// Turn the activity LED off and stop any animation.
    pub fn stop_activity_led(&self) {
        debug!("activity: off");
        self.activity.set(ActivityMode::Off);
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn server(&self) -> Ref<'_, G> {
        self.server.borrow()
    }

    pub fn events(&self) -> Ref<'_, E> {
        self.events.borrow()
    }

    pub(crate) fn emit(&self, event: RuntimeEvent) {
        self.events.borrow_mut().emit(&event);
    }

    pub(crate) fn write_characteristic(&self, handle: CharacteristicHandle, value: &[u8]) -> Result<()> {
        self.server.borrow_mut().write(handle, value)?;
        Ok(())
    }
}

/// Hardware each duty owns exclusively.
pub struct Duties<B, A, L, P> {
    pub board: B,
    pub advertiser: A,
    pub led: L,
    /// Pump outputs; required on boards with actuators, ignored otherwise.
    pub pumps: Option<P>,
}

/// Run every duty until one fails.
///
/// Never returns `Ok`: the duties are infinite loops, so the only way out
/// is the first fatal error.
pub async fn run<G, E, C, B, A, L, P>(ctx: &RuntimeContext<G, E, C>, duties: Duties<B, A, L, P>) -> Result<Infallible>
where
    G: GattServer,
    E: EventSink,
    C: Clock,
    B: BoardDriver,
    A: Advertiser,
    L: IndicatorLed,
    P: PumpOutputs,
{
    let Duties {
        mut board,
        mut advertiser,
        mut led,
        mut pumps,
    } = duties;

    info!("runtime: starting duties for '{}'", ctx.model());

    let joined = future::try_zip(
        future::try_zip(
            sensor::run(ctx, &mut board),
            advertising::run(ctx, &mut advertiser),
        ),
        future::try_zip(blink::run(ctx, &mut led), automation::run(ctx, pumps.as_mut())),
    )
    .await;

    match joined {
        Ok(((never, _), _)) => match never {},
        Err(e) => {
            error!("runtime: fatal duty error: {e}");
            Err(e)
        }
    }
}
