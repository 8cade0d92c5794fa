//! Slot-based interval scheduler.
//!
//! A fixed table of `N` software timers driven from the polling loop. Each
//! timer fires its callback every `period` ticks, either forever or a set
//! number of times, and carries a one-byte payload so one callback can
//! serve several timers.
//!
//! ```text
//!   slot:   0        1        2        3
//!         ┌──────┐ ┌──────┐ ┌──────┐ ┌──────┐
//!         │ 500ms│ │ free │ │ 20ms │ │ free │     add() takes the
//!         │ ∞    │ │      │ │ ×3   │ │      │     lowest free slot
//!         └──────┘ └──────┘ └──────┘ └──────┘
//!            ▲                  │
//!            │      update(now) │ fires, count 3 → 2 → 1 → slot freed
//! ```
//!
//! ## Reentrancy
//!
//! Callbacks receive the scheduler itself and may clear, pause, resume,
//! retune or add timers, their own slot included. [`Intervals::update`]
//! copies the callback and payload out of the slot before the call, and
//! afterwards only touches the slot if it still holds the same timer,
//! tracked with a per-slot generation counter bumped on every `add`.

use log::{debug, info, warn};

use crate::error::{Error, Peripheral, Result};
use crate::time::{Ticks, elapsed, has_elapsed};

/// Called when a timer fires.
pub type IntervalCallback<C, const N: usize> = fn(&mut C, &mut Intervals<C, N>, Fired);

/// Handle to a scheduler slot, valid until the timer is cleared or its
/// count runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(usize);

impl IntervalId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Details passed to a firing callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: IntervalId,
    pub payload: u8,
    pub now: Ticks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Remaining {
    Forever,
    Times(u32),
}

struct Timer<C, const N: usize> {
    callback: IntervalCallback<C, N>,
    period: Ticks,
    last_fire: Ticks,
    remaining: Remaining,
    payload: u8,
    paused: bool,
}

pub struct Intervals<C = (), const N: usize = 8> {
    slots: [Option<Timer<C, N>>; N],
    generations: [u32; N],
}

impl<C, const N: usize> Default for Intervals<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> Intervals<C, N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            generations: [0; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    // ═══════════════════════════════════════════════════════════════
    //  Allocation
    // ═══════════════════════════════════════════════════════════════

    /// Start a timer in the lowest free slot. `count == 0` repeats
    /// forever. The first fire is `period` ticks after `now`.
    pub fn add(
        &mut self,
        callback: IntervalCallback<C, N>,
        period: Ticks,
        count: u32,
        payload: u8,
        now: Ticks,
    ) -> Result<IntervalId> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Capacity {
                kind: Peripheral::Interval,
                capacity: N,
            })?;

        self.generations[index] = self.generations[index].wrapping_add(1);
        self.slots[index] = Some(Timer {
            callback,
            period,
            last_fire: now,
            remaining: if count == 0 {
                Remaining::Forever
            } else {
                Remaining::Times(count)
            },
            payload,
            paused: false,
        });
        info!(
            "interval {}: added period={}ms count={} payload={}",
            index, period, count, payload
        );
        Ok(IntervalId(index))
    }

    /// Fire once after `delay`.
    pub fn after(
        &mut self,
        delay: Ticks,
        callback: IntervalCallback<C, N>,
        now: Ticks,
    ) -> Result<IntervalId> {
        self.add(callback, delay, 1, 0, now)
    }

    /// Fire every `period` until cleared.
    pub fn every(
        &mut self,
        period: Ticks,
        callback: IntervalCallback<C, N>,
        now: Ticks,
    ) -> Result<IntervalId> {
        self.add(callback, period, 0, 0, now)
    }

    /// Fire `count` times, `period` apart.
    pub fn repeat(
        &mut self,
        period: Ticks,
        count: u32,
        callback: IntervalCallback<C, N>,
        now: Ticks,
    ) -> Result<IntervalId> {
        self.add(callback, period, count, 0, now)
    }

    /// Free the slot. Returns `false` if it was already free.
    pub fn clear(&mut self, id: IntervalId) -> bool {
        match self.slots.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                info!("interval {}: cleared", id.0);
                true
            }
            _ => {
                warn!("interval {}: clear on free slot", id.0);
                false
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    //  Control
    // ═══════════════════════════════════════════════════════════════

    pub fn pause(&mut self, id: IntervalId) -> bool {
        self.with_timer(id, "pause", |t| t.paused = true)
    }

    /// Unpause and restart the period from `now`, so a long pause does
    /// not cause an immediate fire.
    pub fn resume(&mut self, id: IntervalId, now: Ticks) -> bool {
        self.with_timer(id, "resume", |t| {
            t.paused = false;
            t.last_fire = now;
        })
    }

    pub fn set_payload(&mut self, id: IntervalId, payload: u8) -> bool {
        self.with_timer(id, "set_payload", |t| t.payload = payload)
    }

    /// Change the period and restart it from `now`.
    pub fn set_period(&mut self, id: IntervalId, period: Ticks, now: Ticks) -> bool {
        self.with_timer(id, "set_period", |t| {
            t.period = period;
            t.last_fire = now;
        })
    }

    fn with_timer(&mut self, id: IntervalId, op: &str, f: impl FnOnce(&mut Timer<C, N>)) -> bool {
        match self.slots.get_mut(id.0).and_then(Option::as_mut) {
            Some(timer) => {
                f(timer);
                debug!("interval {}: {}", id.0, op);
                true
            }
            None => {
                warn!("interval {}: {} on free slot", id.0, op);
                false
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    //  Queries
    // ═══════════════════════════════════════════════════════════════

    fn timer(&self, id: IntervalId) -> Option<&Timer<C, N>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn is_active(&self, id: IntervalId) -> bool {
        self.timer(id).is_some()
    }

    pub fn is_paused(&self, id: IntervalId) -> bool {
        self.timer(id).is_some_and(|t| t.paused)
    }

    pub fn payload(&self, id: IntervalId) -> Option<u8> {
        self.timer(id).map(|t| t.payload)
    }

    /// Fires left, `Some(0)` for a timer that repeats forever, `None` for
    /// a free slot.
    pub fn remaining(&self, id: IntervalId) -> Option<u32> {
        self.timer(id).map(|t| match t.remaining {
            Remaining::Forever => 0,
            Remaining::Times(n) => n,
        })
    }

    /// Ticks until the next fire, ignoring pause.
    pub fn due_in(&self, id: IntervalId, now: Ticks) -> Option<Ticks> {
        self.timer(id)
            .map(|t| t.period.saturating_sub(elapsed(now, t.last_fire)))
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// One `debug!` line per live timer.
    pub fn log_status(&self) {
        debug!("intervals: {}/{} active", self.active_count(), N);
        for (index, timer) in self.slots.iter().enumerate() {
            if let Some(t) = timer {
                debug!(
                    "  ({}) remaining={:?} period={}ms payload={} paused={}",
                    index, t.remaining, t.period, t.payload, t.paused
                );
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    //  Polling
    // ═══════════════════════════════════════════════════════════════

    /// Fire every due, unpaused timer once.
    pub fn update(&mut self, now: Ticks, ctx: &mut C) {
        for index in 0..N {
            let Some(timer) = &self.slots[index] else {
                continue;
            };
            if timer.paused || !has_elapsed(now, timer.last_fire, timer.period) {
                continue;
            }

            let callback = timer.callback;
            let fired = Fired {
                id: IntervalId(index),
                payload: timer.payload,
                now,
            };
            let generation = self.generations[index];
            debug!("interval {}: fired payload={}", index, fired.payload);

            callback(ctx, self, fired);

            if self.generations[index] != generation {
                continue;
            }
            let Some(timer) = self.slots[index].as_mut() else {
                continue;
            };
            timer.last_fire = now;
            if let Remaining::Times(n) = timer.remaining {
                if n <= 1 {
                    self.slots[index] = None;
                    debug!("interval {}: finished", index);
                } else {
                    timer.remaining = Remaining::Times(n - 1);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        fired: Vec<(usize, u8, Ticks)>,
        readded: Option<IntervalId>,
    }

    type Iv = Intervals<Log, 4>;

    fn record(log: &mut Log, _: &mut Iv, f: Fired) {
        log.fired.push((f.id.index(), f.payload, f.now));
    }

    fn run(iv: &mut Iv, log: &mut Log, until: Ticks, step: Ticks) {
        let mut t = 0;
        while t <= until {
            iv.update(t, log);
            t += step;
        }
    }

    #[test]
    fn one_shot_fires_once_and_frees() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv.add(record, 100, 1, 7, 0).unwrap();
        iv.update(99, &mut log);
        assert!(log.fired.is_empty());
        iv.update(100, &mut log);
        iv.update(300, &mut log);
        assert_eq!(log.fired, vec![(0, 7, 100)]);
        assert!(!iv.is_active(id));
        assert_eq!(iv.active_count(), 0);
    }

    #[test]
    fn lowest_free_slot_is_reused() {
        let mut iv = Iv::new();
        let a = iv.every(10, record, 0).unwrap();
        let b = iv.every(10, record, 0).unwrap();
        let _c = iv.every(10, record, 0).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        iv.clear(a);
        iv.clear(b);
        assert_eq!(iv.every(10, record, 0).unwrap().index(), 0);
        assert_eq!(iv.every(10, record, 0).unwrap().index(), 1);
    }

    #[test]
    fn full_table_is_capacity_error() {
        let mut iv = Iv::new();
        for _ in 0..4 {
            iv.every(10, record, 0).unwrap();
        }
        assert_eq!(
            iv.every(10, record, 0),
            Err(Error::Capacity {
                kind: Peripheral::Interval,
                capacity: 4
            })
        );
    }

    #[test]
    fn finite_count_fires_exactly_n_times() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        iv.repeat(50, 3, record, 0).unwrap();
        run(&mut iv, &mut log, 1000, 10);
        let times: Vec<_> = log.fired.iter().map(|f| f.2).collect();
        assert_eq!(times, vec![50, 100, 150]);
    }

    #[test]
    fn forever_keeps_firing() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv.every(100, record, 0).unwrap();
        run(&mut iv, &mut log, 1000, 10);
        assert_eq!(log.fired.len(), 10);
        assert_eq!(iv.remaining(id), Some(0));
    }

    #[test]
    fn pause_holds_and_resume_restarts_period() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv.every(100, record, 0).unwrap();
        assert!(iv.pause(id));
        assert!(iv.is_paused(id));
        iv.update(500, &mut log);
        assert!(log.fired.is_empty());
        assert!(iv.resume(id, 500));
        iv.update(599, &mut log);
        assert!(log.fired.is_empty());
        iv.update(600, &mut log);
        assert_eq!(log.fired, vec![(0, 0, 600)]);
    }

    #[test]
    fn operations_on_free_slot_are_rejected() {
        let mut iv = Iv::new();
        let id = iv.after(10, record, 0).unwrap();
        iv.clear(id);
        assert!(!iv.clear(id));
        assert!(!iv.pause(id));
        assert!(!iv.resume(id, 0));
        assert!(!iv.set_payload(id, 1));
        assert_eq!(iv.remaining(id), None);
    }

    #[test]
    fn payload_can_change_between_fires() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv.add(record, 10, 2, 1, 0).unwrap();
        iv.update(10, &mut log);
        iv.set_payload(id, 2);
        iv.update(20, &mut log);
        assert_eq!(log.fired, vec![(0, 1, 10), (0, 2, 20)]);
    }

    #[test]
    fn callback_may_clear_itself() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv
            .every(
                10,
                |log, iv, f| {
                    log.fired.push((f.id.index(), f.payload, f.now));
                    iv.clear(f.id);
                },
                0,
            )
            .unwrap();
        run(&mut iv, &mut log, 100, 10);
        assert_eq!(log.fired.len(), 1);
        assert!(!iv.is_active(id));
    }

    #[test]
    fn replacement_timer_in_same_slot_is_untouched() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        iv.add(
            |log, iv, f| {
                iv.clear(f.id);
                log.readded = iv.add(record, 100, 3, 9, f.now).ok();
            },
            10,
            1,
            0,
            0,
        )
        .unwrap();
        iv.update(10, &mut log);

        let id = log.readded.unwrap();
        assert_eq!(id.index(), 0);
        assert_eq!(iv.remaining(id), Some(3));
        assert_eq!(iv.payload(id), Some(9));
        iv.update(109, &mut log);
        assert!(log.fired.is_empty());
        iv.update(110, &mut log);
        assert_eq!(log.fired, vec![(0, 9, 110)]);
    }

    #[test]
    fn callback_may_pause_another_timer() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        iv.after(
            10,
            |_, iv, _| {
                iv.pause(IntervalId(1));
            },
            0,
        )
        .unwrap();
        let victim = iv.every(10, record, 0).unwrap();
        iv.update(10, &mut log);
        iv.update(20, &mut log);
        assert!(log.fired.is_empty());
        assert!(iv.is_paused(victim));
    }

    #[test]
    fn callback_may_pause_itself() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv
            .repeat(
                10,
                3,
                |log, iv, f| {
                    log.fired.push((f.id.index(), f.payload, f.now));
                    iv.pause(f.id);
                },
                0,
            )
            .unwrap();
        run(&mut iv, &mut log, 100, 10);
        assert_eq!(log.fired, vec![(0, 0, 10)]);
        assert!(iv.is_paused(id));
        assert_eq!(iv.remaining(id), Some(2));

        iv.resume(id, 100);
        iv.update(110, &mut log);
        assert_eq!(log.fired.len(), 2);
        assert!(iv.is_paused(id));
        assert_eq!(iv.remaining(id), Some(1));
    }

    #[test]
    fn callback_may_change_its_own_period() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv
            .repeat(
                10,
                3,
                |log, iv, f| {
                    log.fired.push((f.id.index(), f.payload, f.now));
                    if log.fired.len() == 1 {
                        iv.set_period(f.id, 30, f.now);
                    }
                },
                0,
            )
            .unwrap();
        run(&mut iv, &mut log, 200, 1);
        let times: Vec<Ticks> = log.fired.iter().map(|&(_, _, t)| t).collect();
        assert_eq!(times, vec![10, 40, 70]);
        assert!(!iv.is_active(id));
    }

    #[test]
    fn set_period_reschedules() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let id = iv.every(100, record, 0).unwrap();
        iv.set_period(id, 30, 50);
        assert_eq!(iv.due_in(id, 60), Some(20));
        iv.update(80, &mut log);
        assert_eq!(log.fired, vec![(0, 0, 80)]);
    }

    #[test]
    fn survives_clock_wrap() {
        let mut iv = Iv::new();
        let mut log = Log::default();
        let start = u32::MAX - 5;
        iv.after(10, record, start).unwrap();
        iv.update(3, &mut log);
        assert!(log.fired.is_empty());
        iv.update(4, &mut log);
        assert_eq!(log.fired.len(), 1);
    }

    #[test]
    fn log_status_on_empty_and_busy_tables() {
        let mut iv = Iv::new();
        iv.log_status();
        iv.every(10, record, 0).unwrap();
        iv.log_status();
    }
}
