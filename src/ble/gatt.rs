//! GATT attribute table construction.
//!
//! The table is built once from the detected capability set, published
//! once, and frozen. [`GattRegistry::publish`] consumes the registry, so
//! nothing can be added after services reach the stack.
//!
//! ## Service layout
//!
//! | Service                    | UUID   | Characteristics                         |
//! |----------------------------|--------|-----------------------------------------|
//! | Environmental Sensing      | 0x181A | one per sensor quantity (read, notify)  |
//! | Automation IO (grow only)  | 0x1815 | one Digital 0x2A56 per pump (r/w/n)     |
//! | Device Information         | 0x180A | manufacturer, model, serial, fw, proto  |
//!
//! Sensor characteristics are registered temperature, humidity, pressure,
//! then the board's extras. Some centrals enumerate them positionally.

use core::fmt::Write;

use log::info;

use crate::app::ports::GattServer;
use crate::board::{BoardModel, CapabilitySet};
use crate::codec::Quantity;
use crate::error::BleError;

pub const ENV_SENSING_SERVICE: u16 = 0x181A;
pub const DEVICE_INFO_SERVICE: u16 = 0x180A;
pub const AUTOMATION_IO_SERVICE: u16 = 0x1815;

pub const CHAR_MANUFACTURER_NAME: u16 = 0x2A29;
pub const CHAR_MODEL_NUMBER: u16 = 0x2A24;
pub const CHAR_SERIAL_NUMBER: u16 = 0x2A25;
pub const CHAR_FIRMWARE_REVISION: u16 = 0x2A26;
pub const CHAR_SOFTWARE_REVISION: u16 = 0x2A28;
pub const CHAR_DIGITAL: u16 = 0x2A56;

pub const MANUFACTURER: &str = "Pimoroni";
/// Protocol version exposed as the Software Revision string.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Digital characteristic values.
pub const DIGITAL_OFF: u8 = 0x00;
pub const DIGITAL_ON: u8 = 0x01;

/// ATT value handle of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacteristicHandle(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl Properties {
    pub const READ: Self = Self { read: true, write: false, notify: false };
    pub const READ_NOTIFY: Self = Self { read: true, write: false, notify: true };
    pub const READ_WRITE_NOTIFY: Self = Self { read: true, write: true, notify: true };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicDef {
    pub uuid: u16,
    pub handle: CharacteristicHandle,
    pub properties: Properties,
    pub initial: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDef {
    pub uuid: u16,
    pub handle: u16,
    pub characteristics: Vec<CharacteristicDef>,
}

/// Binding of a sensor quantity to its characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorBinding {
    pub quantity: Quantity,
    pub handle: CharacteristicHandle,
}

// ---------------------------------------------------------------------------
// Device information
// ---------------------------------------------------------------------------

/// Factory-unique board identifier.
pub type UniqueId = [u8; 8];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub manufacturer: &'static str,
    pub model: BoardModel,
    pub serial: heapless::String<16>,
    pub firmware: heapless::String<32>,
    pub protocol: &'static str,
}

impl DeviceInfo {
    pub fn new(model: BoardModel, unique_id: &UniqueId) -> Self {
        let mut serial = heapless::String::new();
        for b in unique_id {
            let _ = write!(serial, "{b:02x}");
        }
        let mut firmware = heapless::String::new();
        let _ = write!(firmware, "enviroble {}", env!("CARGO_PKG_VERSION"));
        Self {
            manufacturer: MANUFACTURER,
            model,
            serial,
            firmware,
            protocol: PROTOCOL_VERSION,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Attribute table under construction.
#[derive(Debug)]
pub struct GattRegistry {
    services: Vec<ServiceDef>,
    sensors: Vec<SensorBinding>,
    pumps: Vec<CharacteristicHandle>,
    next_handle: u16,
}

impl GattRegistry {
    /// Lay out every service implied by `caps`.
    pub fn build(caps: &CapabilitySet, info: &DeviceInfo) -> Self {
        let mut reg = Self {
            services: Vec::new(),
            sensors: Vec::new(),
            pumps: Vec::new(),
            next_handle: 1,
        };

        reg.begin_service(ENV_SENSING_SERVICE);
        for &quantity in caps.sensors {
            let handle = reg.add_characteristic(quantity.uuid(), Properties::READ_NOTIFY, Vec::new());
            reg.sensors.push(SensorBinding { quantity, handle });
        }

        if caps.has_actuators() {
            reg.begin_service(AUTOMATION_IO_SERVICE);
            for _ in 0..caps.pump_channels {
                let handle = reg.add_characteristic(CHAR_DIGITAL, Properties::READ_WRITE_NOTIFY, vec![DIGITAL_OFF]);
                reg.pumps.push(handle);
            }
        }

        reg.begin_service(DEVICE_INFO_SERVICE);
        let strings: [(u16, &str); 5] = [
            (CHAR_MANUFACTURER_NAME, info.manufacturer),
            (CHAR_MODEL_NUMBER, info.model.name()),
            (CHAR_SERIAL_NUMBER, info.serial.as_str()),
            (CHAR_FIRMWARE_REVISION, info.firmware.as_str()),
            (CHAR_SOFTWARE_REVISION, info.protocol),
        ];
        for (uuid, value) in strings {
            reg.add_characteristic(uuid, Properties::READ, value.as_bytes().to_vec());
        }

        reg
    }

    pub fn services(&self) -> &[ServiceDef] {
        &self.services
    }

    pub fn sensor_bindings(&self) -> &[SensorBinding] {
        &self.sensors
    }

    /// Hand the table to the stack. Consumes the registry.
    pub fn publish<G: GattServer>(self, server: &mut G) -> Result<PublishedGatt, BleError> {
        server.register_services(&self.services)?;
        let count: usize = self.services.iter().map(|s| s.characteristics.len()).sum();
        info!(
            "gatt: {} services, {} characteristics published ({} sensor, {} pump)",
            self.services.len(),
            count,
            self.sensors.len(),
            self.pumps.len()
        );
        Ok(PublishedGatt {
            sensors: self.sensors,
            pumps: self.pumps,
        })
    }

    fn begin_service(&mut self, uuid: u16) {
        let handle = self.alloc(1);
        self.services.push(ServiceDef {
            uuid,
            handle,
            characteristics: Vec::new(),
        });
    }

    /// Declaration + value handle, plus a CCCD when notifiable.
    fn add_characteristic(&mut self, uuid: u16, properties: Properties, initial: Vec<u8>) -> CharacteristicHandle {
        let decl = self.alloc(if properties.notify { 3 } else { 2 });
        let handle = CharacteristicHandle(decl + 1);
        if let Some(service) = self.services.last_mut() {
            service.characteristics.push(CharacteristicDef {
                uuid,
                handle,
                properties,
                initial,
            });
        }
        handle
    }

    fn alloc(&mut self, count: u16) -> u16 {
        let first = self.next_handle;
        self.next_handle += count;
        first
    }
}

/// Frozen binding table, available to duties after publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedGatt {
    sensors: Vec<SensorBinding>,
    pumps: Vec<CharacteristicHandle>,
}

impl PublishedGatt {
    /// Sensor bindings in registration order.
    pub fn sensor_bindings(&self) -> &[SensorBinding] {
        &self.sensors
    }

    /// Digital characteristic of each pump channel, indexed by channel.
    pub fn pump_handles(&self) -> &[CharacteristicHandle] {
        &self.pumps
    }

    /// Pump channel whose Digital characteristic is `handle`.
    pub fn pump_channel(&self, handle: CharacteristicHandle) -> Option<usize> {
        self.pumps.iter().position(|h| *h == handle)
    }
}
