//! Wrap-safe tick arithmetic.
//!
//! Every timed component stores absolute [`Ticks`] stamps taken from the
//! [`Clock`](crate::ports::Clock) and compares them only through
//! [`elapsed`], so a counter that rolls over at `u32::MAX` (about 49.7 days
//! at 1 kHz) never produces a spurious or missed deadline.

/// Millisecond tick counter. Wraps at `u32::MAX`.
pub type Ticks = u32;

/// Ticks elapsed from `since` to `now`, correct across one wrap.
#[inline]
pub const fn elapsed(now: Ticks, since: Ticks) -> Ticks {
    now.wrapping_sub(since)
}

/// `true` once at least `window` ticks have passed since `since`.
#[inline]
pub const fn has_elapsed(now: Ticks, since: Ticks, window: Ticks) -> bool {
    elapsed(now, since) >= window
}
