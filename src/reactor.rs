//! Peripheral registry and polling driver.
//!
//! [`Reactor`] owns the hardware port, the clock, one fixed-capacity table
//! per peripheral kind and the interval scheduler. Registration hands out
//! typed handles; [`Reactor::update`] is the single polling entry point.
//!
//! ```text
//!            ┌──────────────────────── Reactor::update(ctx) ───────────────────────┐
//!  Clock ──► │ now ─► outputs ─► inputs ─► encoders ─► analogs ─► intervals        │
//!            └───────────┬────────────┬─────────────┬───────────┬────────────────────┘
//!                        ▼            ▼             ▼           ▼
//!                  HardwareIo    on_press …   on_clockwise …  on_change …   ──► &mut C
//! ```
//!
//! The clock is read once per update, so every peripheral in one pass sees
//! the same tick.

use log::info;

use crate::config::ReactorConfig;
use crate::drivers::button::{ActiveLevel, DigitalInput};
use crate::drivers::encoder::RotaryEncoder;
use crate::drivers::led::Output;
use crate::error::{Error, Peripheral, Result};
use crate::ports::{Clock, HardwareIo, Pin};
use crate::scheduler::{IntervalCallback, IntervalId, Intervals};
use crate::sensors::analog::AnalogChannel;
use crate::time::Ticks;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a registered output.
    OutputId
);
handle!(
    /// Handle to a registered digital input.
    InputId
);
handle!(
    /// Handle to a registered rotary encoder.
    EncoderId
);
handle!(
    /// Handle to a registered analog channel.
    AnalogId
);

pub struct Reactor<
    H,
    K,
    C = (),
    const OUTPUTS: usize = 4,
    const INPUTS: usize = 4,
    const ENCODERS: usize = 2,
    const ANALOGS: usize = 4,
    const TIMERS: usize = 8,
> {
    io: H,
    clock: K,
    config: ReactorConfig,
    outputs: heapless::Vec<Output, OUTPUTS>,
    inputs: heapless::Vec<DigitalInput<C>, INPUTS>,
    encoders: heapless::Vec<RotaryEncoder<C>, ENCODERS>,
    analogs: heapless::Vec<AnalogChannel<C>, ANALOGS>,
    intervals: Intervals<C, TIMERS>,
}

impl<
    H: HardwareIo,
    K: Clock,
    C,
    const OUTPUTS: usize,
    const INPUTS: usize,
    const ENCODERS: usize,
    const ANALOGS: usize,
    const TIMERS: usize,
> Reactor<H, K, C, OUTPUTS, INPUTS, ENCODERS, ANALOGS, TIMERS>
{
    /// Reactor with the default configuration.
    pub fn new(io: H, clock: K) -> Self {
        Self::build(io, clock, ReactorConfig::default())
    }

    /// Reactor with a validated configuration.
    pub fn with_config(io: H, clock: K, config: ReactorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(io, clock, config))
    }

    fn build(io: H, clock: K, config: ReactorConfig) -> Self {
        info!(
            "reactor: capacity outputs={} inputs={} encoders={} analogs={} timers={}",
            OUTPUTS, INPUTS, ENCODERS, ANALOGS, TIMERS
        );
        Self {
            io,
            clock,
            config,
            outputs: heapless::Vec::new(),
            inputs: heapless::Vec::new(),
            encoders: heapless::Vec::new(),
            analogs: heapless::Vec::new(),
            intervals: Intervals::new(),
        }
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn io(&self) -> &H {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut H {
        &mut self.io
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn now(&self) -> Ticks {
        self.clock.now()
    }

    /// Give back the hardware port and the clock.
    pub fn into_parts(self) -> (H, K) {
        (self.io, self.clock)
    }

    // ── Registration ──────────────────────────────────────────

    pub fn new_output(&mut self, pin: Pin) -> Result<OutputId> {
        let index = next_slot(&self.outputs, Peripheral::Output)?;
        push(&mut self.outputs, Output::new(pin, &mut self.io), Peripheral::Output)?;
        info!("reactor: output {} on pin {}", index, pin);
        Ok(OutputId(index))
    }

    pub fn new_rgb_output(&mut self, red: Pin, green: Pin, blue: Pin) -> Result<OutputId> {
        let index = next_slot(&self.outputs, Peripheral::Output)?;
        let output = Output::new_rgb(red, green, blue, &mut self.io);
        push(&mut self.outputs, output, Peripheral::Output)?;
        info!("reactor: rgb output {} on pins {}/{}/{}", index, red, green, blue);
        Ok(OutputId(index))
    }

    pub fn new_input(&mut self, pin: Pin, active: ActiveLevel) -> Result<InputId> {
        let index = next_slot(&self.inputs, Peripheral::Input)?;
        let now = self.clock.now();
        let input = DigitalInput::new(pin, active, self.config.debounce_ms, &mut self.io, now);
        push(&mut self.inputs, input, Peripheral::Input)?;
        info!("reactor: input {} on pin {} ({:?})", index, pin, active);
        Ok(InputId(index))
    }

    /// Input with the configured default active level.
    pub fn new_button(&mut self, pin: Pin) -> Result<InputId> {
        self.new_input(pin, self.config.default_input_level)
    }

    pub fn new_encoder(&mut self, sw: Pin, dt: Pin, clk: Pin) -> Result<EncoderId> {
        let index = next_slot(&self.encoders, Peripheral::Encoder)?;
        let now = self.clock.now();
        let encoder = RotaryEncoder::new(
            sw,
            dt,
            clk,
            self.config.debounce_ms,
            self.config.encoder_debounce_ms,
            &mut self.io,
            now,
        );
        push(&mut self.encoders, encoder, Peripheral::Encoder)?;
        info!("reactor: encoder {} sw={} dt={} clk={}", index, sw, dt, clk);
        Ok(EncoderId(index))
    }

    /// Register an analog channel. The initial read is deferred until the
    /// first poll or [`Reactor::analog_value`], so ranges and mode can be
    /// set first.
    pub fn new_analog(&mut self, pin: Pin) -> Result<AnalogId> {
        let index = next_slot(&self.analogs, Peripheral::Analog)?;
        push(&mut self.analogs, AnalogChannel::new(pin), Peripheral::Analog)?;
        info!("reactor: analog {} on pin {}", index, pin);
        Ok(AnalogId(index))
    }

    // ── Access ────────────────────────────────────────────────

    /// Output view bound to the hardware and the current tick.
    pub fn output(&mut self, id: OutputId) -> Result<OutputRef<'_, H>> {
        let now = self.clock.now();
        let output = self.outputs.get_mut(id.0).ok_or(Error::InvalidHandle {
            kind: Peripheral::Output,
            index: id.0,
        })?;
        Ok(OutputRef {
            output,
            io: &mut self.io,
            now,
        })
    }

    /// Read-only output state.
    pub fn output_state(&self, id: OutputId) -> Result<&Output> {
        self.outputs.get(id.0).ok_or(Error::InvalidHandle {
            kind: Peripheral::Output,
            index: id.0,
        })
    }

    pub fn input(&mut self, id: InputId) -> Result<&mut DigitalInput<C>> {
        self.inputs.get_mut(id.0).ok_or(Error::InvalidHandle {
            kind: Peripheral::Input,
            index: id.0,
        })
    }

    pub fn encoder(&mut self, id: EncoderId) -> Result<&mut RotaryEncoder<C>> {
        self.encoders.get_mut(id.0).ok_or(Error::InvalidHandle {
            kind: Peripheral::Encoder,
            index: id.0,
        })
    }

    pub fn analog(&mut self, id: AnalogId) -> Result<&mut AnalogChannel<C>> {
        self.analogs.get_mut(id.0).ok_or(Error::InvalidHandle {
            kind: Peripheral::Analog,
            index: id.0,
        })
    }

    /// Reported value of an analog channel, seeding it if needed.
    pub fn analog_value(&mut self, id: AnalogId) -> Result<i32> {
        let channel = self.analogs.get_mut(id.0).ok_or(Error::InvalidHandle {
            kind: Peripheral::Analog,
            index: id.0,
        })?;
        Ok(channel.value(&mut self.io))
    }

    // ── Intervals ─────────────────────────────────────────────

    pub fn intervals(&mut self) -> &mut Intervals<C, TIMERS> {
        &mut self.intervals
    }

    pub fn add_interval(
        &mut self,
        callback: IntervalCallback<C, TIMERS>,
        period: Ticks,
        count: u32,
        payload: u8,
    ) -> Result<IntervalId> {
        let now = self.clock.now();
        self.intervals.add(callback, period, count, payload, now)
    }

    pub fn after(
        &mut self,
        delay: Ticks,
        callback: IntervalCallback<C, TIMERS>,
    ) -> Result<IntervalId> {
        let now = self.clock.now();
        self.intervals.after(delay, callback, now)
    }

    pub fn every(
        &mut self,
        period: Ticks,
        callback: IntervalCallback<C, TIMERS>,
    ) -> Result<IntervalId> {
        let now = self.clock.now();
        self.intervals.every(period, callback, now)
    }

    pub fn repeat(
        &mut self,
        period: Ticks,
        count: u32,
        callback: IntervalCallback<C, TIMERS>,
    ) -> Result<IntervalId> {
        let now = self.clock.now();
        self.intervals.repeat(period, count, callback, now)
    }

    pub fn set_interval_payload(&mut self, id: IntervalId, payload: u8) -> bool {
        self.intervals.set_payload(id, payload)
    }

    pub fn pause_interval(&mut self, id: IntervalId) -> bool {
        self.intervals.pause(id)
    }

    pub fn resume_interval(&mut self, id: IntervalId) -> bool {
        let now = self.clock.now();
        self.intervals.resume(id, now)
    }

    pub fn clear_interval(&mut self, id: IntervalId) -> bool {
        self.intervals.clear(id)
    }

    // ── Polling ───────────────────────────────────────────────

    /// One polling pass: outputs, inputs, encoders, analog channels, then
    /// intervals, each in registration order.
    pub fn update(&mut self, ctx: &mut C) {
        let now = self.clock.now();
        for output in &mut self.outputs {
            output.update(&mut self.io, now);
        }
        for input in &mut self.inputs {
            input.sample(&mut self.io, now, ctx);
        }
        for encoder in &mut self.encoders {
            encoder.sample(&mut self.io, now, ctx);
        }
        for channel in &mut self.analogs {
            channel.sample(&mut self.io, ctx);
        }
        self.intervals.update(now, ctx);
    }
}

/// Index the next registration will get, or `Capacity` when full. Checked
/// before the driver is built so a rejected peripheral never touches its
/// pins.
fn next_slot<T, const N: usize>(table: &heapless::Vec<T, N>, kind: Peripheral) -> Result<usize> {
    if table.is_full() {
        Err(Error::Capacity { kind, capacity: N })
    } else {
        Ok(table.len())
    }
}

fn push<T, const N: usize>(
    table: &mut heapless::Vec<T, N>,
    item: T,
    kind: Peripheral,
) -> Result<()> {
    table
        .push(item)
        .map_err(|_| Error::Capacity { kind, capacity: N })
}

// ───────────────────────────────────────────────────────────────
// OutputRef
// ───────────────────────────────────────────────────────────────

/// Mutable view of one output, carrying the hardware port and the tick
/// at which it was taken. Animation calls start from that tick.
pub struct OutputRef<'a, H> {
    output: &'a mut Output,
    io: &'a mut H,
    now: Ticks,
}

impl<H: HardwareIo> OutputRef<'_, H> {
    pub fn state(&self) -> &Output {
        &*self.output
    }

    pub fn is_on(&self) -> bool {
        self.output.is_on()
    }

    pub fn level(&self) -> u8 {
        self.output.level()
    }

    pub fn turn_on(&mut self) -> &mut Self {
        self.output.turn_on(&mut *self.io);
        self
    }

    pub fn turn_off(&mut self) -> &mut Self {
        self.output.turn_off(&mut *self.io);
        self
    }

    pub fn flip(&mut self) -> &mut Self {
        self.output.flip(&mut *self.io);
        self
    }

    pub fn set_level(&mut self, level: u8) -> &mut Self {
        self.output.set_level(level, &mut *self.io);
        self
    }

    pub fn set_color(&mut self, red: u8, green: u8, blue: u8) -> &mut Self {
        self.output.set_color(red, green, blue, &mut *self.io);
        self
    }

    pub fn set_common_anode(&mut self, common_anode: bool) -> &mut Self {
        self.output.set_common_anode(common_anode);
        self
    }

    pub fn blink(&mut self, period: Ticks) -> &mut Self {
        self.output.blink(period, &mut *self.io, self.now);
        self
    }

    pub fn blink_times(&mut self, period: Ticks, count: u32) -> &mut Self {
        self.output.blink_times(period, count, &mut *self.io, self.now);
        self
    }

    pub fn pulse(&mut self, period: Ticks, count: u32, low: u8, high: u8) -> &mut Self {
        self.output.pulse(period, count, low, high, &mut *self.io, self.now);
        self
    }

    pub fn fade_in(&mut self, duration: Ticks) -> &mut Self {
        self.output.fade_in(duration, &mut *self.io, self.now);
        self
    }

    pub fn fade_in_to(&mut self, duration: Ticks, target: u8) -> &mut Self {
        self.output.fade_in_to(duration, target, &mut *self.io, self.now);
        self
    }

    pub fn fade_out(&mut self, duration: Ticks) -> &mut Self {
        self.output.fade_out(duration, &mut *self.io, self.now);
        self
    }
}
