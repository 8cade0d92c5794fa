//! Ready-made analog channel configurations for common controls.
//!
//! | Preset            | samples | out range | Q | H | T |
//! |-------------------|---------|-----------|---|---|---|
//! | RawData           | 1       | 0..=1023  | 0 | 0 | 1 |
//! | PotForLed         | 8       | 0..=255   | 0 | 0 | 2 |
//! | PotForServo       | 8       | 0..=180   | 0 | 0 | 2 |
//! | PotForPercentage  | 10      | 0..=100   | 5 | 1 | 1 |
//! | Switch5Position   | 12      | 0..=4     | 1 | 1 | 1 |

use serde::{Deserialize, Serialize};

use crate::sensors::stabilizer::Stabilizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Unprocessed 0–1023 readings.
    RawData,
    /// Smooth 0–255, suitable for a PWM level.
    PotForLed,
    /// Smooth 0–180 degrees.
    PotForServo,
    /// 0–100 in steps of 5.
    PotForPercentage,
    /// Five detented positions, 0–4.
    Switch5Position,
}

impl Preset {
    pub const ALL: [Self; 5] = [
        Self::RawData,
        Self::PotForLed,
        Self::PotForServo,
        Self::PotForPercentage,
        Self::Switch5Position,
    ];

    pub const fn config(self) -> PresetConfig {
        match self {
            Self::RawData => PresetConfig::new(1, 0, 1023, 0, 0, 1),
            Self::PotForLed => PresetConfig::new(8, 0, 255, 0, 0, 2),
            Self::PotForServo => PresetConfig::new(8, 0, 180, 0, 0, 2),
            Self::PotForPercentage => PresetConfig::new(10, 0, 100, 5, 1, 1),
            Self::Switch5Position => PresetConfig::new(12, 0, 4, 1, 1, 1),
        }
    }
}

/// Parameters applied to a channel by
/// [`AnalogChannel::configure_with`](super::analog::AnalogChannel::configure_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetConfig {
    pub smoothing: u8,
    pub output_min: i32,
    pub output_max: i32,
    /// Quantize step `Q`; `0` selects threshold mode.
    pub quantize_step: i32,
    /// Hysteresis `H`; `0` derives `Q / 4`.
    pub hysteresis: i32,
    /// Change threshold `T` for non-quantized mode.
    pub change_threshold: i32,
}

impl PresetConfig {
    pub const fn new(
        smoothing: u8,
        output_min: i32,
        output_max: i32,
        quantize_step: i32,
        hysteresis: i32,
        change_threshold: i32,
    ) -> Self {
        Self {
            smoothing,
            output_min,
            output_max,
            quantize_step,
            hysteresis,
            change_threshold,
        }
    }

    pub fn stabilizer(&self) -> Stabilizer {
        if self.quantize_step > 0 {
            let h = if self.hysteresis > 0 {
                self.hysteresis
            } else {
                self.quantize_step / 4
            };
            Stabilizer::quantized(self.quantize_step, h)
        } else if self.change_threshold > 1 {
            Stabilizer::Threshold(self.change_threshold)
        } else {
            Stabilizer::Raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_preset_quantizes() {
        assert_eq!(
            Preset::PotForPercentage.config().stabilizer(),
            Stabilizer::Quantized {
                step: 5,
                hysteresis: 1
            }
        );
    }

    #[test]
    fn led_preset_uses_threshold() {
        let c = Preset::PotForLed.config();
        assert_eq!(c.stabilizer(), Stabilizer::Threshold(2));
        assert_eq!((c.output_min, c.output_max), (0, 255));
    }

    #[test]
    fn raw_preset_is_raw() {
        assert_eq!(Preset::RawData.config().stabilizer(), Stabilizer::Raw);
    }

    #[test]
    fn zero_hysteresis_derives_quarter_step() {
        let c = PresetConfig::new(4, 0, 1000, 20, 0, 1);
        assert_eq!(
            c.stabilizer(),
            Stabilizer::Quantized {
                step: 20,
                hysteresis: 5
            }
        );
    }

    #[test]
    fn presets_serialize() {
        for p in Preset::ALL {
            let json = serde_json::to_string(&p.config()).unwrap();
            let back: PresetConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(back, p.config());
        }
    }
}
