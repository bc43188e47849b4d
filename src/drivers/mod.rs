//! embedded-hal drivers for the board's LED, pump outputs and sensor bus.

pub mod activity_led;
pub mod bus_scan;
pub mod pump_outputs;
