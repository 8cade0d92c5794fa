//! Stabilized analog input channel (potentiometer, slider, light sensor).
//!
//! ## Pipeline
//!
//! ```text
//! raw ──► smoothing window ──► clamp(in) ──► map(in → out) ──► clamp(out)
//!     ──► invert? ──► hi-res ──► stabilizer ──► reported ──► zones
//! ```
//!
//! Each poll adds one raw sample; the rest of the pipeline runs once the
//! window is full. The first computation ("initial read") fills the window
//! with a single reading and seeds the reported value and zone without
//! firing any callback, so a control resting at 37 does not announce "37"
//! at boot. It happens lazily on the first [`AnalogChannel::sample`] or
//! [`AnalogChannel::value`] call, after the application had its chance to
//! configure ranges and mode.

use log::{debug, info};

use crate::error::Result;
use crate::ports::{HardwareIo, Pin};
use crate::sensors::preset::{Preset, PresetConfig};
use crate::sensors::stabilizer::{Stabilizer, clamp, saturate};
use crate::sensors::zones::{Zone, ZoneMap};

pub type ValueCallback<C> = fn(&mut C, i32);
pub type ZoneCallback<C> = fn(&mut C, Option<u8>);

/// Zone classification moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneChange {
    pub from: Option<u8>,
    pub to: Option<u8>,
}

/// What one poll committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalogUpdate {
    /// New reported value.
    pub value: Option<i32>,
    pub zone: Option<ZoneChange>,
}

pub struct AnalogChannel<C = ()> {
    pin: Pin,
    input: (i32, i32),
    output: (i32, i32),
    inverted: bool,
    samples: u8,
    accumulator: i64,
    count: u8,
    stabilizer: Stabilizer,
    hi_res: i32,
    reported: i32,
    zones: ZoneMap,
    zone: Option<u8>,
    seeded: bool,
    on_change: Option<ValueCallback<C>>,
    on_zone_change: Option<ZoneCallback<C>>,
}

impl<C> AnalogChannel<C> {
    /// A channel on `pin` with 10-bit ranges, no smoothing, raw mode.
    pub fn new(pin: Pin) -> Self {
        Self {
            pin,
            input: (0, 1023),
            output: (0, 1023),
            inverted: false,
            samples: 1,
            accumulator: 0,
            count: 0,
            stabilizer: Stabilizer::Raw,
            hi_res: 0,
            reported: 0,
            zones: ZoneMap::new(),
            zone: None,
            seeded: false,
            on_change: None,
            on_zone_change: None,
        }
    }

    pub fn input_range(&mut self, min: i32, max: i32) -> &mut Self {
        self.input = (min, max);
        self
    }

    pub fn output_range(&mut self, min: i32, max: i32) -> &mut Self {
        self.output = (min, max);
        self
    }

    /// Mirror the output so `out_min` and `out_max` swap ends.
    pub fn invert(&mut self) -> &mut Self {
        self.inverted = true;
        self
    }

    /// Average `samples` readings per computed value (at least 1).
    pub fn smoothing(&mut self, samples: u8) -> &mut Self {
        self.samples = samples.max(1);
        self.accumulator = 0;
        self.count = 0;
        self
    }

    /// Quantize to `step` with hysteresis `step / 4`.
    pub fn quantize(&mut self, step: i32) -> &mut Self {
        self.quantize_with(step, step / 4)
    }

    pub fn quantize_with(&mut self, step: i32, hysteresis: i32) -> &mut Self {
        self.stabilizer = Stabilizer::quantized(step, hysteresis);
        self
    }

    pub fn change_threshold(&mut self, threshold: i32) -> &mut Self {
        self.stabilizer = if threshold > 1 {
            Stabilizer::Threshold(threshold)
        } else {
            Stabilizer::Raw
        };
        self
    }

    pub fn stabilizer(&mut self, stabilizer: Stabilizer) -> &mut Self {
        self.stabilizer = stabilizer;
        self
    }

    pub fn configure(&mut self, preset: Preset) -> &mut Self {
        info!("analog pin {}: preset {:?}", self.pin, preset);
        self.configure_with(preset.config())
    }

    /// Apply smoothing, output range and mode from `config`. The input
    /// range is left alone.
    pub fn configure_with(&mut self, config: PresetConfig) -> &mut Self {
        self.smoothing(config.smoothing);
        self.output = (config.output_min, config.output_max);
        self.stabilizer = config.stabilizer();
        self
    }

    pub fn on_change(&mut self, callback: ValueCallback<C>) -> &mut Self {
        self.on_change = Some(callback);
        self
    }

    pub fn on_zone_change(&mut self, callback: ZoneCallback<C>) -> &mut Self {
        self.on_zone_change = Some(callback);
        self
    }

    /// Append a zone. Rejects `min > max` and a full zone table.
    pub fn add_zone(&mut self, id: u8, min: i32, max: i32) -> Result<&mut Self> {
        self.zones.add(Zone::new(id, min, max)?)?;
        Ok(self)
    }

    /// Drop all zones and forget the current classification.
    pub fn clear_zones(&mut self) -> &mut Self {
        self.zones.clear();
        self.zone = None;
        self
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    /// Last committed value.
    pub fn reported(&self) -> i32 {
        self.reported
    }

    /// Last mapped value before stabilization.
    pub fn hi_res(&self) -> i32 {
        self.hi_res
    }

    pub fn current_zone(&self) -> Option<u8> {
        self.zone
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Reported value, performing the initial read if it has not happened.
    pub fn value(&mut self, io: &mut impl HardwareIo) -> i32 {
        if !self.seeded {
            let raw = io.read_analog(self.pin);
            self.seed(raw);
        }
        self.reported
    }

    /// Poll the pin. The first call only seeds.
    pub fn sample(&mut self, io: &mut impl HardwareIo, ctx: &mut C) -> AnalogUpdate {
        let raw = io.read_analog(self.pin);
        self.sample_raw(raw, ctx)
    }

    /// Feed an already-read sample through the pipeline.
    pub fn sample_raw(&mut self, raw: i32, ctx: &mut C) -> AnalogUpdate {
        if !self.seeded {
            self.seed(raw);
            return AnalogUpdate::default();
        }

        self.accumulator += i64::from(raw);
        self.count += 1;
        if self.count < self.samples {
            return AnalogUpdate::default();
        }

        let mean = saturate(self.accumulator / i64::from(self.samples));
        self.accumulator = 0;
        self.count = 0;
        self.hi_res = self.map(mean);

        let mut update = AnalogUpdate::default();
        let (out_min, out_max) = self.output;
        if let Some(value) = self
            .stabilizer
            .evaluate(self.hi_res, self.reported, out_min, out_max)
        {
            self.reported = value;
            debug!("analog pin {}: value {}", self.pin, value);
            if let Some(callback) = self.on_change {
                callback(ctx, value);
            }
            update.value = Some(value);
        }

        if !self.zones.is_empty() {
            let to = self.zones.classify(self.reported);
            if to != self.zone {
                let change = ZoneChange {
                    from: self.zone,
                    to,
                };
                self.zone = to;
                debug!("analog pin {}: zone {:?} -> {:?}", self.pin, change.from, to);
                if let Some(callback) = self.on_zone_change {
                    callback(ctx, to);
                }
                update.zone = Some(change);
            }
        }
        update
    }

    fn seed(&mut self, raw: i32) {
        self.accumulator = 0;
        self.count = 0;
        self.hi_res = self.map(raw);
        let (out_min, out_max) = self.output;
        self.reported = self.stabilizer.seed(self.hi_res, out_min, out_max);
        if !self.zones.is_empty() {
            self.zone = self.zones.classify(self.reported);
        }
        self.seeded = true;
        info!("analog pin {}: initial value {}", self.pin, self.reported);
    }

    /// Clamp, map, clamp, invert.
    fn map(&self, mean: i32) -> i32 {
        let (in_min, in_max) = self.input;
        let (out_min, out_max) = self.output;
        let clamped = clamp(mean, in_min, in_max);
        let mapped = map_range(clamped, in_min, in_max, out_min, out_max);
        let hi_res = clamp(mapped, out_min, out_max);
        if self.inverted {
            saturate(i64::from(out_max) + i64::from(out_min) - i64::from(hi_res))
        } else {
            hi_res
        }
    }
}

/// Linear integer map, truncating toward zero. A zero-width input range
/// maps to `out_min`.
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let span = i64::from(in_max) - i64::from(in_min);
    if span == 0 {
        return out_min;
    }
    let offset = i64::from(value) - i64::from(in_min);
    let scaled = offset * (i64::from(out_max) - i64::from(out_min)) / span;
    saturate(i64::from(out_min) + scaled)
}
