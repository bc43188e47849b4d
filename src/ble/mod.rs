//! BLE peripheral-role data: attribute table and advertising payload.
//!
//! The stack itself is reached through the ports in
//! [`app::ports`](crate::app::ports); this module only shapes what is
//! handed to it.

pub mod adv;
pub mod gatt;
