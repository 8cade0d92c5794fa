//! Fuzz target: `AnalogChannel::sample_raw`
//!
//! The first 20 bytes pick ranges, smoothing and stabilizer; the rest are
//! raw samples. The reported value must never leave the output range and
//! the pipeline must never panic, whatever the ranges.
//!
//! cargo fuzz run fuzz_analog_pipeline

#![no_main]

use devicereactor::sensors::analog::AnalogChannel;
use libfuzzer_sys::fuzz_target;

fn word(data: &[u8], at: usize) -> i32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&data[at..at + 4]);
    i32::from_le_bytes(b)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 20 {
        return;
    }
    let (in_min, in_max) = (word(data, 0), word(data, 4));
    let (out_min, out_max) = (i32::from(data[8] as i8) * 8, i32::from(data[9]) * 8);
    let smoothing = data[10];
    let mode = data[11] % 3;
    let step = i32::from(data[12] as i8);
    let hysteresis = i32::from(data[13] as i8);
    let zone = (i32::from(data[14]), i32::from(data[15]));

    let mut channel: AnalogChannel = AnalogChannel::new(0);
    channel
        .input_range(in_min, in_max)
        .output_range(out_min, out_max)
        .smoothing(smoothing);
    match mode {
        0 => channel.change_threshold(step),
        1 => channel.quantize_with(step, hysteresis),
        _ => channel.quantize(step),
    };
    if zone.0 <= zone.1 {
        let _ = channel.add_zone(1, zone.0, zone.1);
    }
    if data[16] & 1 == 1 {
        channel.invert();
    }

    for chunk in data[20..].chunks_exact(4) {
        let raw = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let _ = channel.sample_raw(raw, &mut ());
        let v = channel.reported();
        if out_min <= out_max {
            assert!(
                v >= out_min && v <= out_max,
                "reported {} outside {}..={}",
                v,
                out_min,
                out_max
            );
        }
        if let Some(id) = channel.current_zone() {
            assert_eq!(id, 1);
            assert!(v >= zone.0 && v <= zone.1);
        }
    }
});
