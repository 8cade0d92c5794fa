//! Rotary encoder with push switch (KY-040 style).
//!
//! The detent switch is a [`DigitalInput`]. Rotation is decoded from the
//! CLK/DT quadrature pair: only the rising CLK edge counts, so one detent
//! produces one step instead of two. At that edge DT still equal to CLK
//! means clockwise; DT already differing means counter-clockwise.
//!
//! ```text
//!        ┌───┐   ┌───┐
//! CLK ───┘   └───┘   └──     ↑ = sample point
//!        ↑       ↑
//!      ┌───┐   ┌───┐
//! DT ──┘   └───┘   └────     DT != CLK at ↑  →  counter-clockwise
//! ```

use log::{debug, trace};

use crate::drivers::button::{ActiveLevel, DigitalInput, EdgeCallback, InputEvent};
use crate::ports::{HardwareIo, Pin};
use crate::time::{Ticks, has_elapsed};

/// Decoded rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Everything one poll of an encoder produced. Button and rotation are
/// independent and may both be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderSample {
    pub button: Option<InputEvent>,
    pub rotation: Option<Rotation>,
}

pub struct RotaryEncoder<C = ()> {
    switch: DigitalInput<C>,
    dt: Pin,
    clk: Pin,
    debounce: Ticks,
    last_clk: bool,
    last_rotation: Ticks,
    on_clockwise: Option<EdgeCallback<C>>,
    on_counter_clockwise: Option<EdgeCallback<C>>,
}

impl<C> RotaryEncoder<C> {
    /// All three lines are pulled-up inputs; the switch is active low.
    pub fn new(
        sw: Pin,
        dt: Pin,
        clk: Pin,
        button_debounce: Ticks,
        rotation_debounce: Ticks,
        io: &mut impl HardwareIo,
        now: Ticks,
    ) -> Self {
        let switch = DigitalInput::new(sw, ActiveLevel::PullUp, button_debounce, io, now);
        io.configure_input(dt, true);
        io.configure_input(clk, true);
        let last_clk = io.read_digital(clk);
        Self {
            switch,
            dt,
            clk,
            debounce: rotation_debounce,
            last_clk,
            last_rotation: now,
            on_clockwise: None,
            on_counter_clockwise: None,
        }
    }

    pub fn on_press(&mut self, callback: EdgeCallback<C>) -> &mut Self {
        self.switch.on_press(callback);
        self
    }

    pub fn on_release(&mut self, callback: EdgeCallback<C>) -> &mut Self {
        self.switch.on_release(callback);
        self
    }

    pub fn on_clockwise(&mut self, callback: EdgeCallback<C>) -> &mut Self {
        self.on_clockwise = Some(callback);
        self
    }

    pub fn on_counter_clockwise(&mut self, callback: EdgeCallback<C>) -> &mut Self {
        self.on_counter_clockwise = Some(callback);
        self
    }

    /// The detent switch.
    pub fn switch(&self) -> &DigitalInput<C> {
        &self.switch
    }

    /// Poll the switch, then the quadrature pair.
    pub fn sample(&mut self, io: &mut impl HardwareIo, now: Ticks, ctx: &mut C) -> EncoderSample {
        let button = self.switch.sample(io, now, ctx);

        let clk = io.read_digital(self.clk);
        let rising = clk && !self.last_clk;
        self.last_clk = clk;

        let rotation = if rising {
            self.step(io, clk, now, ctx)
        } else {
            None
        };

        EncoderSample { button, rotation }
    }

    fn step(
        &mut self,
        io: &mut impl HardwareIo,
        clk: bool,
        now: Ticks,
        ctx: &mut C,
    ) -> Option<Rotation> {
        if !has_elapsed(now, self.last_rotation, self.debounce) {
            trace!("encoder clk {}: rotation bounce rejected", self.clk);
            return None;
        }
        self.last_rotation = now;

        let rotation = if io.read_digital(self.dt) == clk {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        };
        debug!("encoder clk {}: {:?}", self.clk, rotation);

        let callback = match rotation {
            Rotation::Clockwise => self.on_clockwise,
            Rotation::CounterClockwise => self.on_counter_clockwise,
        };
        if let Some(callback) = callback {
            callback(ctx);
        }
        Some(rotation)
    }
}
