//! Debounced digital input (push button, limit switch, reed contact).
//!
//! ## Debounce
//!
//! The raw level is sampled on every poll. A level that differs from the
//! committed stable level is accepted only when at least the debounce
//! window has passed since the previous accepted transition; otherwise it
//! is a bounce and is dropped (the raw level is still tracked). Once the
//! contact settles, the next poll after the window commits it, so the
//! stable level always converges to the settled one.
//!
//! | Active level | Pull-up | Pressed when |
//! |--------------|---------|--------------|
//! | `High`       | no      | pin high     |
//! | `Low`        | no      | pin low      |
//! | `PullUp`     | yes     | pin low      |

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::ports::{HardwareIo, Pin};
use crate::time::{Ticks, has_elapsed};

/// Which electrical level means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveLevel {
    /// Pressed reads high (external pull-down).
    High,
    /// Pressed reads low (external pull-up).
    Low,
    /// Pressed reads low, internal pull-up enabled.
    PullUp,
}

impl ActiveLevel {
    /// Whether `level` counts as pressed.
    pub const fn is_active(self, level: bool) -> bool {
        match self {
            Self::High => level,
            Self::Low | Self::PullUp => !level,
        }
    }

    /// Whether the pin needs its internal pull-up.
    pub const fn pull_up(self) -> bool {
        matches!(self, Self::PullUp)
    }
}

/// Edge emitted after debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pressed,
    Released,
}

/// Callback invoked on a debounced edge.
pub type EdgeCallback<C> = fn(&mut C);

pub struct DigitalInput<C = ()> {
    pin: Pin,
    active: ActiveLevel,
    debounce: Ticks,
    stable: bool,
    raw: bool,
    last_transition: Ticks,
    on_press: Option<EdgeCallback<C>>,
    on_release: Option<EdgeCallback<C>>,
}

impl<C> DigitalInput<C> {
    /// Configure the pin and seed the stable level from its current state,
    /// so the first real edge after setup is not missed.
    pub fn new(
        pin: Pin,
        active: ActiveLevel,
        debounce: Ticks,
        io: &mut impl HardwareIo,
        now: Ticks,
    ) -> Self {
        io.configure_input(pin, active.pull_up());
        let level = io.read_digital(pin);
        Self {
            pin,
            active,
            debounce,
            stable: level,
            raw: level,
            last_transition: now,
            on_press: None,
            on_release: None,
        }
    }

    pub fn on_press(&mut self, callback: EdgeCallback<C>) -> &mut Self {
        self.on_press = Some(callback);
        self
    }

    pub fn on_release(&mut self, callback: EdgeCallback<C>) -> &mut Self {
        self.on_release = Some(callback);
        self
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    /// Last committed (debounced) level.
    pub fn stable_level(&self) -> bool {
        self.stable
    }

    /// Last sampled level, bounces included.
    pub fn raw_level(&self) -> bool {
        self.raw
    }

    /// Whether the debounced level counts as pressed.
    pub fn is_pressed(&self) -> bool {
        self.active.is_active(self.stable)
    }

    /// Read the pin and advance the debounce state machine.
    /// Fires the matching callback and returns the edge, if one was
    /// committed on this poll.
    pub fn sample(
        &mut self,
        io: &mut impl HardwareIo,
        now: Ticks,
        ctx: &mut C,
    ) -> Option<InputEvent> {
        let level = io.read_digital(self.pin);
        self.sample_level(level, now, ctx)
    }

    /// Advance the state machine with an already-read level.
    pub fn sample_level(&mut self, level: bool, now: Ticks, ctx: &mut C) -> Option<InputEvent> {
        let raw_changed = level != self.raw;
        self.raw = level;

        if level == self.stable {
            return None;
        }

        if !has_elapsed(now, self.last_transition, self.debounce) {
            if raw_changed {
                trace!("input pin {}: bounce rejected", self.pin);
            }
            return None;
        }

        self.stable = level;
        self.last_transition = now;

        let event = if self.active.is_active(level) {
            InputEvent::Pressed
        } else {
            InputEvent::Released
        };
        debug!("input pin {}: {:?}", self.pin, event);

        let callback = match event {
            InputEvent::Pressed => self.on_press,
            InputEvent::Released => self.on_release,
        };
        if let Some(callback) = callback {
            callback(ctx);
        }
        Some(event)
    }
}
