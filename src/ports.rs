//! Port traits: the boundary between the polling engine and the board.
//!
//! ```text
//!   Board adapter ──▶ HardwareIo / Clock ──▶ Reactor (engine)
//! ```
//!
//! Adapters (simulation, `embedded-hal` bridges, vendor HALs) implement
//! these traits. The [`Reactor`](crate::reactor::Reactor) consumes them via
//! generics, so the state machines never touch registers directly and run
//! unchanged on the host.

use crate::time::Ticks;

/// Board pin number as understood by the [`HardwareIo`] adapter.
pub type Pin = u8;

// ───────────────────────────────────────────────────────────────
// Hardware port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// Raw pin access. All methods are infallible from the engine's point of
/// view: an adapter that can fail must absorb the error itself, logging it
/// and returning a neutral reading.
pub trait HardwareIo {
    /// Configure `pin` as a digital input, optionally with the internal
    /// pull-up enabled. Called once per pin at registration.
    fn configure_input(&mut self, pin: Pin, pull_up: bool) {
        let _ = (pin, pull_up);
    }

    /// Configure `pin` as an output. Called once per pin at registration.
    fn configure_output(&mut self, pin: Pin) {
        let _ = pin;
    }

    /// Current logic level of `pin` (`true` = high).
    fn read_digital(&mut self, pin: Pin) -> bool;

    /// Raw ADC count of `pin`, typically `0..=1023` or `0..=4095`.
    fn read_analog(&mut self, pin: Pin) -> i32;

    /// Drive `pin` high or low.
    fn write_digital(&mut self, pin: Pin, high: bool);

    /// Drive `pin` with a PWM level, `0` = always low, `255` = always high.
    fn write_analog_level(&mut self, pin: Pin, level: u8);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock. The value wraps at `u32::MAX`; consumers
/// compare stamps only through [`crate::time::elapsed`].
pub trait Clock {
    fn now(&self) -> Ticks;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Ticks {
        (**self).now()
    }
}
