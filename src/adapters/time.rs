//! Clock adapters.
//!
//! - [`ManualClock`]: set by hand, for tests and deterministic simulation.
//! - [`StdClock`]: `std::time::Instant` for host-side runs.
//! - `EmbassyClock`: `embassy_time::Instant` for targets with an embassy
//!   time driver (feature `embassy`).
//!
//! Every clock reports milliseconds truncated to [`Ticks`], so it wraps
//! the same way a hardware millisecond counter does.

use core::cell::Cell;

use crate::ports::Clock;
use crate::time::Ticks;

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Ticks>,
}

impl ManualClock {
    pub const fn new(start: Ticks) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Ticks) {
        self.now.set(now);
    }

    /// Move forward by `ticks`, wrapping like the hardware counter.
    pub fn advance(&self, ticks: Ticks) {
        self.now.set(self.now.get().wrapping_add(ticks));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        self.now.get()
    }
}

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> Ticks {
        self.start.elapsed().as_millis() as Ticks
    }
}

/// Milliseconds since boot from the embassy time driver.
#[cfg(feature = "embassy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl Clock for EmbassyClock {
    fn now(&self) -> Ticks {
        embassy_time::Instant::now().as_millis() as Ticks
    }
}
