//! Application boundary: ports and outbound events.
//!
//! Everything the runtime needs from the outside world is expressed as a
//! trait in [`ports`]; everything it reports is a [`events::RuntimeEvent`].

pub mod events;
pub mod ports;
