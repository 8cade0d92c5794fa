//! Illumination output driver: plain, dimmable, or RGB LED.
//!
//! ## Output kinds
//!
//! | Kind      | On                           | Off                        |
//! |-----------|------------------------------|----------------------------|
//! | Plain     | digital high                 | digital low                |
//! | Dimmable  | PWM at `level`               | PWM 0                      |
//! | RGB       | three PWM channels = colour  | all channels dark          |
//!
//! An output becomes dimmable the first time a level is set, either
//! explicitly or by a pulse/fade. RGB outputs default to common anode,
//! where a channel is lit by pulling it low, so channel values are
//! inverted on write.
//!
//! Animations come from [`Animator`]; [`Output::update`] applies one frame
//! per poll.

use log::debug;

use crate::drivers::animation::{Animator, FadeKind, Frame};
use crate::ports::{HardwareIo, Pin};
use crate::time::Ticks;

/// Colour as (R, G, B), each 0–255, before any common-anode inversion.
pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Rgb { green: Pin, blue: Pin },
}

#[derive(Debug, Clone)]
pub struct Output {
    pin: Pin,
    kind: Kind,
    on: bool,
    level: u8,
    dimmable: bool,
    colour: Rgb,
    common_anode: bool,
    /// Level to restore once a fade-out has switched the output off.
    resume_level: Option<u8>,
    animator: Animator,
}

impl Output {
    /// Single-pin output, initially off.
    pub fn new(pin: Pin, io: &mut impl HardwareIo) -> Self {
        io.configure_output(pin);
        let output = Self::with_kind(pin, Kind::Plain);
        output.write(io);
        output
    }

    /// RGB output on three PWM pins, initially off.
    pub fn new_rgb(red: Pin, green: Pin, blue: Pin, io: &mut impl HardwareIo) -> Self {
        for pin in [red, green, blue] {
            io.configure_output(pin);
        }
        let output = Self::with_kind(red, Kind::Rgb { green, blue });
        output.write(io);
        output
    }

    fn with_kind(pin: Pin, kind: Kind) -> Self {
        Self {
            pin,
            kind,
            on: false,
            level: 255,
            dimmable: false,
            colour: (0, 0, 0),
            common_anode: true,
            resume_level: None,
            animator: Animator::new(),
        }
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_rgb(&self) -> bool {
        matches!(self.kind, Kind::Rgb { .. })
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn turn_on(&mut self, io: &mut impl HardwareIo) {
        self.set_on(true, io);
    }

    /// Switch off and cancel any running animation.
    pub fn turn_off(&mut self, io: &mut impl HardwareIo) {
        self.animator.cancel();
        self.resume_level = None;
        self.set_on(false, io);
    }

    pub fn flip(&mut self, io: &mut impl HardwareIo) {
        self.set_on(!self.on, io);
    }

    /// Set the PWM level. Takes effect immediately when on.
    pub fn set_level(&mut self, level: u8, io: &mut impl HardwareIo) {
        self.dimmable = true;
        self.level = level;
        if self.on {
            self.write(io);
        }
    }

    /// Set the RGB colour. Takes effect immediately when on.
    pub fn set_color(&mut self, red: u8, green: u8, blue: u8, io: &mut impl HardwareIo) {
        self.colour = (red, green, blue);
        if self.on {
            self.write(io);
        }
    }

    pub fn set_common_anode(&mut self, common_anode: bool) {
        self.common_anode = common_anode;
    }

    /// Blink forever with a full on/off `period`.
    pub fn blink(&mut self, period: Ticks, io: &mut impl HardwareIo, now: Ticks) {
        self.blink_times(period, 0, io, now);
    }

    /// Blink `count` times, ending off. `count == 0` blinks forever.
    pub fn blink_times(&mut self, period: Ticks, count: u32, io: &mut impl HardwareIo, now: Ticks) {
        self.resume_level = None;
        let frame = self.animator.start_blink(period, count, self.on, now);
        self.apply(frame, io);
    }

    /// Pulse between `low` and `high`, `count` cycles (0 = forever).
    pub fn pulse(
        &mut self,
        period: Ticks,
        count: u32,
        low: u8,
        high: u8,
        io: &mut impl HardwareIo,
        now: Ticks,
    ) {
        self.resume_level = None;
        let frame = self.animator.start_pulse(period, count, low, high, now);
        self.apply(frame, io);
    }

    /// Fade from dark to full brightness.
    pub fn fade_in(&mut self, duration: Ticks, io: &mut impl HardwareIo, now: Ticks) {
        self.fade_in_to(duration, 255, io, now);
    }

    /// Fade from dark to `target`.
    pub fn fade_in_to(
        &mut self,
        duration: Ticks,
        target: u8,
        io: &mut impl HardwareIo,
        now: Ticks,
    ) {
        self.resume_level = None;
        let frame = self.animator.start_fade(FadeKind::In, duration, 0, target, now);
        self.apply(frame, io);
    }

    /// Fade from the current brightness to dark, then switch off.
    /// Does nothing when already off.
    pub fn fade_out(&mut self, duration: Ticks, io: &mut impl HardwareIo, now: Ticks) {
        if !self.on {
            return;
        }
        let start = if self.dimmable && self.level > 0 {
            self.level
        } else {
            255
        };
        self.resume_level = Some(start);
        let frame = self.animator.start_fade(FadeKind::Out, duration, start, 0, now);
        self.apply(frame, io);
    }

    /// Advance the running animation by one poll.
    pub fn update(&mut self, io: &mut impl HardwareIo, now: Ticks) {
        let frame = self.animator.advance(now);
        self.apply(frame, io);
    }

    fn apply(&mut self, frame: Frame, io: &mut impl HardwareIo) {
        match frame {
            Frame::Hold => {}
            Frame::Toggle => self.flip(io),
            Frame::Level(level) => {
                self.dimmable = true;
                self.level = level;
                self.set_on(true, io);
            }
            Frame::Off => {
                if let Some(level) = self.resume_level.take() {
                    self.level = level;
                }
                debug!("output pin {}: animation finished off", self.pin);
                self.set_on(false, io);
            }
        }
    }

    fn set_on(&mut self, on: bool, io: &mut impl HardwareIo) {
        self.on = on;
        self.write(io);
    }

    fn write(&self, io: &mut impl HardwareIo) {
        match self.kind {
            Kind::Rgb { green, blue } => {
                let (r, g, b) = if self.on { self.colour } else { (0, 0, 0) };
                let drive = |v: u8| if self.common_anode { 255 - v } else { v };
                io.write_analog_level(self.pin, drive(r));
                io.write_analog_level(green, drive(g));
                io.write_analog_level(blue, drive(b));
            }
            Kind::Plain if self.dimmable => {
                io.write_analog_level(self.pin, if self.on { self.level } else { 0 });
            }
            Kind::Plain => io.write_digital(self.pin, self.on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{PinWrite, SimHardware};

    const PIN: Pin = 9;

    #[test]
    fn plain_output_starts_off() {
        let mut io = SimHardware::new();
        let out = Output::new(PIN, &mut io);
        assert!(!out.is_on());
        assert_eq!(io.last_write(PIN), Some(PinWrite::Digital(false)));
    }

    #[test]
    fn flip_toggles_digital_level() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.flip(&mut io);
        assert_eq!(io.last_write(PIN), Some(PinWrite::Digital(true)));
        out.flip(&mut io);
        assert_eq!(io.last_write(PIN), Some(PinWrite::Digital(false)));
    }

    #[test]
    fn set_level_only_writes_when_on() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.set_level(80, &mut io);
        assert_eq!(io.last_write(PIN), Some(PinWrite::Digital(false)));
        out.turn_on(&mut io);
        assert_eq!(io.last_write(PIN), Some(PinWrite::Analog(80)));
    }

    #[test]
    fn rgb_common_anode_inverts_channels() {
        let mut io = SimHardware::new();
        let mut out = Output::new_rgb(5, 6, 7, &mut io);
        assert_eq!(io.last_write(5), Some(PinWrite::Analog(255)));
        out.set_color(255, 0, 100, &mut io);
        out.turn_on(&mut io);
        assert_eq!(io.last_write(5), Some(PinWrite::Analog(0)));
        assert_eq!(io.last_write(6), Some(PinWrite::Analog(255)));
        assert_eq!(io.last_write(7), Some(PinWrite::Analog(155)));
    }

    #[test]
    fn rgb_common_cathode_passes_through() {
        let mut io = SimHardware::new();
        let mut out = Output::new_rgb(5, 6, 7, &mut io);
        out.set_common_anode(false);
        out.set_color(10, 20, 30, &mut io);
        out.turn_on(&mut io);
        assert_eq!(io.last_write(6), Some(PinWrite::Analog(20)));
        out.turn_off(&mut io);
        assert_eq!(io.last_write(6), Some(PinWrite::Analog(0)));
    }

    #[test]
    fn blink_count_ends_off_from_either_state() {
        for start_on in [false, true] {
            let mut io = SimHardware::new();
            let mut out = Output::new(PIN, &mut io);
            if start_on {
                out.turn_on(&mut io);
            }
            io.clear_history();
            out.blink_times(100, 3, &mut io, 0);
            for t in (0..=1000).step_by(10) {
                out.update(&mut io, t);
            }
            let flips = io.writes_to(PIN).count();
            assert_eq!(flips, if start_on { 5 } else { 6 });
            assert!(!out.is_on());
            assert!(!out.animator().is_active());
        }
    }

    #[test]
    fn pulse_applies_first_frame_immediately() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.pulse(1000, 0, 20, 200, &mut io, 0);
        assert!(out.is_on());
        assert_eq!(io.last_write(PIN), Some(PinWrite::Analog(20)));
    }

    #[test]
    fn fade_out_switches_off_and_restores_level() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.set_level(120, &mut io);
        out.turn_on(&mut io);
        out.fade_out(100, &mut io, 0);
        out.update(&mut io, 50);
        assert_eq!(io.last_write(PIN), Some(PinWrite::Analog(60)));
        out.update(&mut io, 100);
        assert!(!out.is_on());
        assert_eq!(io.last_write(PIN), Some(PinWrite::Analog(0)));
        assert_eq!(out.level(), 120);
    }

    #[test]
    fn fade_out_when_off_is_noop() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.fade_out(100, &mut io, 0);
        assert!(!out.animator().is_active());
    }

    #[test]
    fn turn_off_cancels_animation() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.blink(100, &mut io, 0);
        out.turn_off(&mut io);
        out.update(&mut io, 500);
        assert!(!out.is_on());
        assert!(!out.animator().is_active());
    }

    #[test]
    fn blink_replaces_pulse() {
        let mut io = SimHardware::new();
        let mut out = Output::new(PIN, &mut io);
        out.pulse(1000, 0, 0, 255, &mut io, 0);
        out.blink(100, &mut io, 0);
        assert!(out.animator().is_blinking());
        assert!(!out.animator().is_ramping());
    }
}
