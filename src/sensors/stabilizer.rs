//! Stabilization modes for the analog pipeline.
//!
//! A mode decides whether a fresh hi-res value is different enough from
//! the last reported value to be committed. All arithmetic is done in
//! `i64` so wide output ranges cannot overflow.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stabilizer {
    /// Any change commits.
    Raw,
    /// Commit when the hi-res value moves at least this far from the
    /// reported value. `1` or less is the same as [`Stabilizer::Raw`].
    Threshold(i32),
    /// Snap to multiples of `step`, with a dead band of `hysteresis` past
    /// the half-step boundary in either direction.
    Quantized { step: i32, hysteresis: i32 },
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::Raw
    }
}

impl Stabilizer {
    /// Quantized mode, or raw when `step` is not positive.
    pub fn quantized(step: i32, hysteresis: i32) -> Self {
        if step > 0 {
            Self::Quantized {
                step,
                hysteresis: hysteresis.max(0),
            }
        } else {
            Self::Raw
        }
    }

    /// Reported value used as the baseline after the initial read.
    pub fn seed(self, hi_res: i32, out_min: i32, out_max: i32) -> i32 {
        match self {
            Self::Quantized { step, .. } => clamp(round_to_step(hi_res, step), out_min, out_max),
            Self::Raw | Self::Threshold(_) => hi_res,
        }
    }

    /// New reported value if `hi_res` crosses this mode's commit condition.
    pub fn evaluate(self, hi_res: i32, reported: i32, out_min: i32, out_max: i32) -> Option<i32> {
        match self {
            Self::Quantized { step, hysteresis } => {
                let candidate = clamp(round_to_step(hi_res, step), out_min, out_max);
                if candidate == reported {
                    return None;
                }
                let margin = i64::from(step / 2) + i64::from(hysteresis);
                let hi = i64::from(hi_res);
                let crossed = if candidate > reported {
                    hi >= i64::from(reported) + margin
                } else {
                    hi <= i64::from(reported) - margin
                };
                crossed.then_some(candidate)
            }
            Self::Threshold(t) if t > 1 => {
                let distance = (i64::from(hi_res) - i64::from(reported)).abs();
                (distance >= i64::from(t)).then_some(hi_res)
            }
            Self::Raw | Self::Threshold(_) => (hi_res != reported).then_some(hi_res),
        }
    }
}

/// Round `value` to the nearest multiple of `step`, halves away from zero.
/// Exact for every `i32`; `step <= 0` returns `value` unchanged.
pub fn round_to_step(value: i32, step: i32) -> i32 {
    if step <= 0 {
        return value;
    }
    let q = i64::from(step);
    let magnitude = i64::from(value).abs();
    let snapped = (2 * magnitude + q) / (2 * q) * q;
    let signed = if value < 0 { -snapped } else { snapped };
    saturate(signed)
}

/// Clamp without panicking on an inverted range.
pub(crate) fn clamp(value: i32, min: i32, max: i32) -> i32 {
    value.max(min).min(max)
}

pub(crate) fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_halves_go_away_from_zero() {
        assert_eq!(round_to_step(12, 5), 10);
        assert_eq!(round_to_step(13, 5), 15);
        assert_eq!(round_to_step(5, 10), 10);
        assert_eq!(round_to_step(-5, 10), -10);
        assert_eq!(round_to_step(-4, 10), 0);
        assert_eq!(round_to_step(7, 1), 7);
        assert_eq!(round_to_step(i32::MAX, 1000), i32::MAX);
    }

    #[test]
    fn quantized_rising_needs_upper_trigger() {
        let s = Stabilizer::quantized(5, 1);
        assert_eq!(s.evaluate(11, 10, 0, 100), None);
        assert_eq!(s.evaluate(12, 10, 0, 100), None);
        assert_eq!(s.evaluate(13, 10, 0, 100), Some(15));
    }

    #[test]
    fn quantized_falling_needs_lower_trigger() {
        let s = Stabilizer::quantized(5, 1);
        assert_eq!(s.evaluate(8, 10, 0, 100), None);
        assert_eq!(s.evaluate(7, 10, 0, 100), Some(5));
    }

    #[test]
    fn quantized_held_value_never_moves() {
        let s = Stabilizer::quantized(5, 1);
        for _ in 0..10 {
            assert_eq!(s.evaluate(12, 10, 0, 100), None);
            assert_eq!(s.evaluate(13, 15, 0, 100), None);
        }
    }

    #[test]
    fn quantized_alternation_across_both_triggers_flips() {
        // 13 is the upper trigger from 10, 12 the lower trigger from 15.
        let s = Stabilizer::quantized(5, 1);
        let mut reported = 10;
        let mut history = Vec::new();
        for v in [12, 13, 12, 13] {
            if let Some(n) = s.evaluate(v, reported, 0, 100) {
                reported = n;
                history.push(n);
            }
        }
        assert_eq!(history, vec![15, 10, 15]);
    }

    #[test]
    fn quantized_candidate_is_clamped_to_output() {
        let s = Stabilizer::quantized(10, 0);
        assert_eq!(s.seed(99, 0, 99), 99);
        assert_eq!(s.evaluate(99, 90, 0, 99), Some(99));
    }

    #[test]
    fn threshold_uses_distance() {
        let s = Stabilizer::Threshold(3);
        assert_eq!(s.evaluate(52, 50, 0, 100), None);
        assert_eq!(s.evaluate(53, 50, 0, 100), Some(53));
        assert_eq!(s.evaluate(47, 50, 0, 100), Some(47));
    }

    #[test]
    fn small_threshold_is_raw() {
        for s in [Stabilizer::Raw, Stabilizer::Threshold(1), Stabilizer::Threshold(0)] {
            assert_eq!(s.evaluate(50, 50, 0, 100), None);
            assert_eq!(s.evaluate(51, 50, 0, 100), Some(51));
        }
    }

    #[test]
    fn non_positive_step_selects_raw() {
        assert_eq!(Stabilizer::quantized(0, 2), Stabilizer::Raw);
        assert_eq!(Stabilizer::quantized(-4, 1), Stabilizer::Raw);
    }

    #[test]
    fn clamp_tolerates_inverted_range() {
        assert_eq!(clamp(5, 10, 0), 0);
    }
}
