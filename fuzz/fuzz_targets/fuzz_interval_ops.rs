//! Fuzz target: `Intervals` under arbitrary operation sequences
//!
//! Each byte pair is one operation: add, clear, pause, resume, retune or
//! advance the clock. Callbacks themselves clear and add timers, so the
//! reentrant path is exercised too. Slot accounting must stay consistent.
//!
//! cargo fuzz run fuzz_interval_ops

#![no_main]

use devicereactor::{Fired, IntervalId, Intervals, Ticks};
use libfuzzer_sys::fuzz_target;

const SLOTS: usize = 4;

type Iv = Intervals<u32, SLOTS>;

fn churn(fires: &mut u32, iv: &mut Iv, f: Fired) {
    *fires += 1;
    if f.payload & 1 == 1 {
        iv.clear(f.id);
        let _ = iv.after(u32::from(f.payload), churn, f.now);
    }
}

fuzz_target!(|data: &[u8]| {
    let mut iv = Iv::new();
    let mut fires = 0u32;
    let mut now: Ticks = u32::MAX - 1_000;
    let mut issued: [Option<IntervalId>; SLOTS] = [None; SLOTS];

    for op in data.chunks_exact(2) {
        let (code, arg) = (op[0], op[1]);
        if code % 6 == 0 {
            let before = iv.active_count();
            match iv.add(churn, u32::from(arg), u32::from(code >> 4), arg, now) {
                Ok(id) => {
                    assert_eq!(iv.active_count(), before + 1);
                    issued[id.index()] = Some(id);
                }
                Err(_) => assert_eq!(before, SLOTS),
            }
            continue;
        }
        if code % 6 == 5 {
            now = now.wrapping_add(u32::from(arg));
            iv.update(now, &mut fires);
            continue;
        }
        let Some(id) = issued[usize::from(arg) % SLOTS] else {
            continue;
        };
        match code % 6 {
            1 => {
                let was = iv.is_active(id);
                assert_eq!(iv.clear(id), was);
            }
            2 => {
                iv.pause(id);
            }
            3 => {
                iv.resume(id, now);
            }
            _ => {
                iv.set_period(id, u32::from(arg), now);
            }
        }
        assert!(iv.active_count() <= SLOTS);
    }
});
