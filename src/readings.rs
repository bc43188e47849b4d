//! One polling cycle's reading set.
//!
//! Produced fresh by the board driver on every sensor-duty iteration and
//! dropped once its payloads are written. Nothing is carried over between
//! cycles.

use heapless::LinearMap;

use crate::codec::Quantity;

/// Number of analog moisture inputs on boards that have them.
pub const MOISTURE_CHANNELS: usize = 3;

/// Named physical quantities from a single acquisition.
#[derive(Debug, Clone)]
pub struct Readings {
    values: LinearMap<Quantity, f32, 5>,
    moisture: [Option<f32>; MOISTURE_CHANNELS],
}

impl Default for Readings {
    fn default() -> Self {
        Self::new()
    }
}

impl Readings {
    pub fn new() -> Self {
        Self {
            values: LinearMap::new(),
            moisture: [None; MOISTURE_CHANNELS],
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, quantity: Quantity, value: f32) -> Self {
        self.set(quantity, value);
        self
    }

    pub fn set(&mut self, quantity: Quantity, value: f32) {
        // Capacity equals the number of quantities, so insert cannot fail.
        let _ = self.values.insert(quantity, value);
    }

    pub fn get(&self, quantity: Quantity) -> Option<f32> {
        self.values.get(&quantity).copied()
    }

    /// Record a moisture level (percent). Out-of-range channels are ignored.
    pub fn set_moisture(&mut self, channel: usize, percent: f32) {
        if let Some(slot) = self.moisture.get_mut(channel) {
            *slot = Some(percent);
        }
    }

    pub fn moisture(&self) -> [Option<f32>; MOISTURE_CHANNELS] {
        self.moisture
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quantity, f32)> + '_ {
        self.values.iter().map(|(q, v)| (*q, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
