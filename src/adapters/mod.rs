//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements           | Connects to                  |
//! |---------------|----------------------|------------------------------|
//! | `device_id`   | none                 | Flash unique ID (simulated)  |
//! | `log_sink`    | EventSink            | `log` facade                 |
//! | `sim`         | BusProbe, SensePin   | Simulated board and BLE link |
//! |               | BoardDriver          |                              |
//! |               | GattServer           |                              |
//! |               | Advertiser           |                              |
//! | `time`        | Clock                | `async-io-mini` timers       |

pub mod device_id;
pub mod log_sink;
pub mod sim;
pub mod time;
