//! In-memory hardware for host simulation and tests.
//!
//! Input levels and ADC readings are set by the test; every output write
//! is recorded so assertions can inspect the full command history without
//! touching real GPIO/PWM registers.

use crate::ports::{HardwareIo, Pin};

const PINS: usize = 256;

/// One recorded output write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinWrite {
    Digital(bool),
    Analog(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Direction {
    #[default]
    Unconfigured,
    Input { pull_up: bool },
    Output,
}

pub struct SimHardware {
    digital: [bool; PINS],
    analog: [i32; PINS],
    direction: [Direction; PINS],
    history: Vec<(Pin, PinWrite)>,
}

impl Default for SimHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHardware {
    /// All pins low, all ADC readings zero.
    pub fn new() -> Self {
        Self {
            digital: [false; PINS],
            analog: [0; PINS],
            direction: [Direction::Unconfigured; PINS],
            history: Vec::new(),
        }
    }

    pub fn set_digital(&mut self, pin: Pin, high: bool) {
        self.digital[usize::from(pin)] = high;
    }

    pub fn set_analog(&mut self, pin: Pin, value: i32) {
        self.analog[usize::from(pin)] = value;
    }

    /// Pull-up setting if `pin` was configured as an input.
    pub fn pull_up(&self, pin: Pin) -> Option<bool> {
        match self.direction[usize::from(pin)] {
            Direction::Input { pull_up } => Some(pull_up),
            _ => None,
        }
    }

    pub fn is_output(&self, pin: Pin) -> bool {
        self.direction[usize::from(pin)] == Direction::Output
    }

    pub fn history(&self) -> &[(Pin, PinWrite)] {
        &self.history
    }

    pub fn writes_to(&self, pin: Pin) -> impl Iterator<Item = PinWrite> + '_ {
        self.history
            .iter()
            .filter(move |(p, _)| *p == pin)
            .map(|&(_, w)| w)
    }

    pub fn last_write(&self, pin: Pin) -> Option<PinWrite> {
        self.writes_to(pin).last()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl HardwareIo for SimHardware {
    fn configure_input(&mut self, pin: Pin, pull_up: bool) {
        self.direction[usize::from(pin)] = Direction::Input { pull_up };
    }

    fn configure_output(&mut self, pin: Pin) {
        self.direction[usize::from(pin)] = Direction::Output;
    }

    fn read_digital(&mut self, pin: Pin) -> bool {
        self.digital[usize::from(pin)]
    }

    fn read_analog(&mut self, pin: Pin) -> i32 {
        self.analog[usize::from(pin)]
    }

    fn write_digital(&mut self, pin: Pin, high: bool) {
        self.digital[usize::from(pin)] = high;
        self.history.push((pin, PinWrite::Digital(high)));
    }

    fn write_analog_level(&mut self, pin: Pin, level: u8) {
        self.history.push((pin, PinWrite::Analog(level)));
    }
}
