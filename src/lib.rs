//! enviroble runtime library.
//!
//! Board detection, characteristic encoding, GATT layout and the
//! cooperative duty runtime for an Enviro BLE sensing node. Everything
//! that touches hardware or the BLE stack sits behind the port traits in
//! [`app::ports`], so the whole runtime runs and tests on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod ble;
pub mod board;
pub mod codec;
pub mod config;
pub mod error;
pub mod pins;
pub mod pump;
pub mod readings;
pub mod runtime;

pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
