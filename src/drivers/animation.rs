//! Non-blocking animation engine for a single output.
//!
//! Produces [`Frame`] commands from elapsed time; the
//! [`Output`](super::led::Output) driver applies them to the pin. The
//! engine never reads the clock itself and never writes hardware, so every
//! ramp is testable as plain arithmetic.
//!
//! ## Animations
//!
//! | Animation | Behaviour                                                    |
//! |-----------|--------------------------------------------------------------|
//! | Blink     | Toggle every half period; finite counts end OFF              |
//! | Pulse     | Triangle ramp `low → high → low`, `count` cycles (0 = loop)  |
//! | Fade      | Single ramp to a target; fade-out switches the output off    |
//!
//! Only one animation exists per output: [`Animator`] holds a single enum,
//! so starting a new one replaces whatever ran before.

use log::debug;

use crate::time::{Ticks, elapsed};

/// What the output should do on this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Nothing to change.
    Hold,
    /// Flip the on/off state.
    Toggle,
    /// Switch on at this PWM level.
    Level(u8),
    /// Switch off.
    Off,
}

/// Direction of a one-shot fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeKind {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Animation {
    Idle,
    Blink {
        half_period: Ticks,
        /// `0` = blink forever.
        toggles_max: u32,
        toggles_done: u32,
        last_toggle: Ticks,
    },
    Pulse {
        low: u8,
        high: u8,
        half_period: Ticks,
        rising: bool,
        leg_start: Ticks,
        /// `0` = pulse forever.
        cycles_max: u32,
        cycles_done: u32,
    },
    Fade {
        kind: FadeKind,
        from: u8,
        to: u8,
        duration: Ticks,
        start: Ticks,
    },
}

/// Per-output animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animator {
    animation: Animation,
    level: u8,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    pub const fn new() -> Self {
        Self {
            animation: Animation::Idle,
            level: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.animation, Animation::Idle)
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.animation, Animation::Blink { .. })
    }

    /// Pulse or fade in progress.
    pub fn is_ramping(&self) -> bool {
        matches!(
            self.animation,
            Animation::Pulse { .. } | Animation::Fade { .. }
        )
    }

    /// Level of the most recent ramp frame.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn cancel(&mut self) {
        self.animation = Animation::Idle;
    }

    /// Start blinking with a full on/off `period`. A non-zero `count` stops
    /// after that many blinks with the output OFF, whatever its state
    /// now (`2N` toggles from OFF, `2N - 1` from ON). `count == 0` blinks
    /// forever. The first toggle lands one half period from `now`.
    pub fn start_blink(
        &mut self,
        period: Ticks,
        count: u32,
        currently_on: bool,
        now: Ticks,
    ) -> Frame {
        let toggles_max = match count {
            0 => 0,
            n if currently_on => n.saturating_mul(2) - 1,
            n => n.saturating_mul(2),
        };
        self.animation = Animation::Blink {
            half_period: (period / 2).max(1),
            toggles_max,
            toggles_done: 0,
            last_toggle: now,
        };
        debug!("animation: blink period={}ms toggles={}", period, toggles_max);
        Frame::Hold
    }

    /// Start a triangle pulse between `low` and `high`; `period` is one
    /// full low-high-low cycle. Returns the first frame (`low`).
    pub fn start_pulse(
        &mut self,
        period: Ticks,
        count: u32,
        low: u8,
        high: u8,
        now: Ticks,
    ) -> Frame {
        self.animation = Animation::Pulse {
            low,
            high,
            half_period: period.max(2) / 2,
            rising: true,
            leg_start: now,
            cycles_max: count,
            cycles_done: 0,
        };
        self.level = low;
        debug!("animation: pulse {}..{} period={}ms count={}", low, high, period, count);
        Frame::Level(low)
    }

    /// Start a one-shot ramp from `from` to `to` over `duration`.
    /// Returns the first frame (`from`).
    pub fn start_fade(
        &mut self,
        kind: FadeKind,
        duration: Ticks,
        from: u8,
        to: u8,
        now: Ticks,
    ) -> Frame {
        self.animation = Animation::Fade {
            kind,
            from,
            to,
            duration: duration.max(1),
            start: now,
        };
        self.level = from;
        debug!("animation: fade {:?} {}..{} over {}ms", kind, from, to, duration);
        Frame::Level(from)
    }

    /// Advance to `now` and report what the output should do.
    pub fn advance(&mut self, now: Ticks) -> Frame {
        match self.animation {
            Animation::Idle => Frame::Hold,
            Animation::Blink { .. } => self.advance_blink(now),
            Animation::Pulse { .. } => self.advance_pulse(now),
            Animation::Fade { .. } => self.advance_fade(now),
        }
    }

    fn advance_blink(&mut self, now: Ticks) -> Frame {
        let Animation::Blink {
            half_period,
            toggles_max,
            ref mut toggles_done,
            ref mut last_toggle,
        } = self.animation
        else {
            return Frame::Hold;
        };

        if elapsed(now, *last_toggle) < half_period {
            return Frame::Hold;
        }
        *last_toggle = now;
        *toggles_done += 1;

        if toggles_max > 0 && *toggles_done >= toggles_max {
            debug!("animation: blink complete");
            self.animation = Animation::Idle;
            return Frame::Off;
        }
        Frame::Toggle
    }

    fn advance_pulse(&mut self, now: Ticks) -> Frame {
        let Animation::Pulse {
            low,
            high,
            half_period,
            ref mut rising,
            ref mut leg_start,
            cycles_max,
            ref mut cycles_done,
        } = self.animation
        else {
            return Frame::Hold;
        };

        let t = elapsed(now, *leg_start);
        if t < half_period {
            let level = if *rising {
                ramp(low, high, t, half_period)
            } else {
                ramp(high, low, t, half_period)
            };
            return self.emit(level);
        }

        // Leg complete: snap to its end point.
        *leg_start = now;
        if *rising {
            *rising = false;
            return self.emit_snap(high);
        }

        *rising = true;
        *cycles_done += 1;
        if cycles_max > 0 && *cycles_done >= cycles_max {
            debug!("animation: pulse complete after {} cycles", cycles_max);
            self.animation = Animation::Idle;
        }
        self.emit_snap(low)
    }

    fn advance_fade(&mut self, now: Ticks) -> Frame {
        let Animation::Fade {
            kind,
            from,
            to,
            duration,
            start,
        } = self.animation
        else {
            return Frame::Hold;
        };

        let t = elapsed(now, start);
        if t < duration {
            return self.emit(ramp(from, to, t, duration));
        }

        debug!("animation: fade {:?} complete", kind);
        self.animation = Animation::Idle;
        self.level = to;
        match kind {
            FadeKind::In => Frame::Level(to),
            FadeKind::Out => Frame::Off,
        }
    }

    /// Emit only when the level moved.
    fn emit(&mut self, level: u8) -> Frame {
        if level == self.level {
            Frame::Hold
        } else {
            self.level = level;
            Frame::Level(level)
        }
    }

    /// Always emit leg end points, so the bound is written exactly.
    fn emit_snap(&mut self, level: u8) -> Frame {
        self.level = level;
        Frame::Level(level)
    }
}

/// Integer interpolation `from + (to - from) * t / span`, widened before the
/// multiply. Works in either direction and never leaves `[from, to]` for
/// `t <= span`.
fn ramp(from: u8, to: u8, t: Ticks, span: Ticks) -> u8 {
    let delta = i64::from(to) - i64::from(from);
    let t = i64::from(t.min(span));
    let level = i64::from(from) + delta * t / i64::from(span.max(1));
    level.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_hits_endpoints() {
        assert_eq!(ramp(0, 255, 0, 100), 0);
        assert_eq!(ramp(0, 255, 50, 100), 127);
        assert_eq!(ramp(0, 255, 100, 100), 255);
        assert_eq!(ramp(200, 40, 100, 100), 40);
        assert_eq!(ramp(200, 40, 500, 100), 40);
    }

    #[test]
    fn blink_from_off_needs_even_toggles() {
        let mut a = Animator::new();
        a.start_blink(100, 2, false, 0);
        let frames: Vec<_> = (1..=4).map(|i| a.advance(i * 50)).collect();
        assert_eq!(
            frames,
            vec![Frame::Toggle, Frame::Toggle, Frame::Toggle, Frame::Off]
        );
        assert!(!a.is_active());
    }

    #[test]
    fn blink_from_on_needs_odd_toggles() {
        let mut a = Animator::new();
        a.start_blink(100, 2, true, 0);
        let frames: Vec<_> = (1..=3).map(|i| a.advance(i * 50)).collect();
        assert_eq!(frames, vec![Frame::Toggle, Frame::Toggle, Frame::Off]);
        assert_eq!(a.advance(1000), Frame::Hold);
    }

    #[test]
    fn blink_waits_half_period() {
        let mut a = Animator::new();
        a.start_blink(100, 0, false, 0);
        assert_eq!(a.advance(49), Frame::Hold);
        assert_eq!(a.advance(50), Frame::Toggle);
        assert_eq!(a.advance(99), Frame::Hold);
        assert_eq!(a.advance(100), Frame::Toggle);
        assert!(a.is_blinking());
    }

    #[test]
    fn zero_period_blink_is_clamped() {
        let mut a = Animator::new();
        a.start_blink(0, 0, false, 10);
        assert_eq!(a.advance(10), Frame::Hold);
        assert_eq!(a.advance(11), Frame::Toggle);
    }

    #[test]
    fn pulse_ramps_up_then_down() {
        let mut a = Animator::new();
        assert_eq!(a.start_pulse(200, 0, 0, 100, 0), Frame::Level(0));
        assert_eq!(a.advance(50), Frame::Level(50));
        assert_eq!(a.advance(100), Frame::Level(100));
        assert_eq!(a.advance(150), Frame::Level(50));
        assert_eq!(a.advance(200), Frame::Level(0));
        assert!(a.is_ramping());
    }

    #[test]
    fn finite_pulse_stops_at_low() {
        let mut a = Animator::new();
        a.start_pulse(100, 1, 10, 200, 0);
        a.advance(50);
        assert_eq!(a.advance(100), Frame::Level(10));
        assert!(!a.is_active());
        assert_eq!(a.level(), 10);
    }

    #[test]
    fn pulse_holds_when_level_unchanged() {
        let mut a = Animator::new();
        a.start_pulse(2000, 0, 0, 10, 0);
        // 10 steps over 1000 ms: 50 ms in is still level 0.
        assert_eq!(a.advance(50), Frame::Hold);
        assert_eq!(a.advance(100), Frame::Level(1));
    }

    #[test]
    fn fade_out_ends_off() {
        let mut a = Animator::new();
        assert_eq!(a.start_fade(FadeKind::Out, 100, 200, 0, 0), Frame::Level(200));
        assert_eq!(a.advance(50), Frame::Level(100));
        assert_eq!(a.advance(100), Frame::Off);
        assert!(!a.is_active());
    }

    #[test]
    fn fade_in_snaps_to_target() {
        let mut a = Animator::new();
        a.start_fade(FadeKind::In, 3, 0, 255, 0);
        assert_eq!(a.advance(1), Frame::Level(85));
        assert_eq!(a.advance(7), Frame::Level(255));
        assert_eq!(a.advance(8), Frame::Hold);
    }

    #[test]
    fn new_animation_replaces_old() {
        let mut a = Animator::new();
        a.start_blink(100, 0, false, 0);
        a.start_fade(FadeKind::In, 100, 0, 255, 0);
        assert!(!a.is_blinking());
        assert!(a.is_ramping());
    }
}
