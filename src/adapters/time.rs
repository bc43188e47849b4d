//! Reactor-backed clock.
//!
//! `now_ms` comes from `std::time::Instant` captured at construction;
//! `sleep` parks the calling duty on an `async_io_mini::Timer`, so the
//! executor thread is free for the other duties while it waits.

use core::time::Duration;
use std::time::Instant;

use async_io_mini::Timer;

use crate::app::ports::Clock;

pub struct ReactorClock {
    start: Instant,
}

impl Default for ReactorClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactorClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for ReactorClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn sleep(&self, duration: Duration) {
        Timer::after(duration).await;
    }
}
