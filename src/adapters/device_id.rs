//! Board identity from the flash chip's factory-unique ID.
//!
//! The 8-byte ID is the source of the Device Information serial number
//! (rendered by [`DeviceInfo`](crate::ble::gatt::DeviceInfo)). On the host
//! a fixed ID stands in, so simulated runs are reproducible.

use crate::ble::gatt::UniqueId;

/// Simulation: returns a deterministic fake ID.
pub fn read_unique_id() -> UniqueId {
    [0xE6, 0x61, 0x38, 0x52, 0x83, 0x4A, 0x2B, 0x2C]
}
