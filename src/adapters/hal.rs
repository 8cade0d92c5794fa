//! `embedded-hal` 1.0 bridge.
//!
//! [`HalIo`] maps reactor pin numbers onto concrete HAL pin objects, one
//! table per role. Pins of a role share a type, which is what HALs that
//! offer type-erased pins (`AnyPin`, `Flex`, degraded pins) provide.
//!
//! | Role    | Trait                              | Used by                         |
//! |---------|------------------------------------|---------------------------------|
//! | input   | `digital::InputPin`                | `read_digital`                  |
//! | output  | `digital::OutputPin`               | `write_digital`                 |
//! | pwm     | `pwm::SetDutyCycle`                | `write_analog_level`            |
//! | analog  | [`AnalogSource`]                   | `read_analog`                   |
//!
//! Pull-ups are chosen when the HAL pin is constructed, so
//! `configure_input` only checks that the pin is bound. HAL errors and
//! unbound pins are logged and absorbed: a failed read returns a neutral
//! value and the loop keeps running.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::error::{Error, Peripheral, Result};
use crate::ports::{HardwareIo, Pin};

/// One ADC channel. `embedded-hal` 1.0 has no ADC trait, so boards
/// implement this for their converter.
pub trait AnalogSource {
    type Error: core::fmt::Debug;

    fn read(&mut self) -> core::result::Result<i32, Self::Error>;
}

type Table<T, const N: usize> = heapless::Vec<(Pin, T), N>;

pub struct HalIo<I, O, P, A, const N: usize = 16> {
    inputs: Table<I, N>,
    outputs: Table<O, N>,
    pwm: Table<P, N>,
    analog: Table<A, N>,
}

impl<I, O, P, A, const N: usize> Default for HalIo<I, O, P, A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O, P, A, const N: usize> HalIo<I, O, P, A, N> {
    pub const fn new() -> Self {
        Self {
            inputs: heapless::Vec::new(),
            outputs: heapless::Vec::new(),
            pwm: heapless::Vec::new(),
            analog: heapless::Vec::new(),
        }
    }

    pub fn bind_input(&mut self, pin: Pin, hal: I) -> Result<&mut Self> {
        bind(&mut self.inputs, pin, hal, Peripheral::Input)?;
        Ok(self)
    }

    pub fn bind_output(&mut self, pin: Pin, hal: O) -> Result<&mut Self> {
        bind(&mut self.outputs, pin, hal, Peripheral::Output)?;
        Ok(self)
    }

    pub fn bind_pwm(&mut self, pin: Pin, hal: P) -> Result<&mut Self> {
        bind(&mut self.pwm, pin, hal, Peripheral::Output)?;
        Ok(self)
    }

    pub fn bind_analog(&mut self, pin: Pin, hal: A) -> Result<&mut Self> {
        bind(&mut self.analog, pin, hal, Peripheral::Analog)?;
        Ok(self)
    }
}

fn bind<T, const N: usize>(
    table: &mut Table<T, N>,
    pin: Pin,
    hal: T,
    kind: Peripheral,
) -> Result<()> {
    table
        .push((pin, hal))
        .map_err(|_| Error::Capacity { kind, capacity: N })?;
    debug!("hal: bound {} pin {}", kind, pin);
    Ok(())
}

fn lookup<T, const N: usize>(table: &mut Table<T, N>, pin: Pin) -> Option<&mut T> {
    table.iter_mut().find(|(p, _)| *p == pin).map(|(_, hal)| hal)
}

impl<I, O, P, A, const N: usize> HardwareIo for HalIo<I, O, P, A, N>
where
    I: InputPin,
    O: OutputPin,
    P: SetDutyCycle,
    A: AnalogSource,
{
    fn configure_input(&mut self, pin: Pin, pull_up: bool) {
        if lookup(&mut self.inputs, pin).is_none() {
            warn!("hal: input pin {} (pull_up={}) is not bound", pin, pull_up);
        }
    }

    fn configure_output(&mut self, pin: Pin) {
        if lookup(&mut self.outputs, pin).is_none() && lookup(&mut self.pwm, pin).is_none() {
            warn!("hal: output pin {} is not bound", pin);
        }
    }

    fn read_digital(&mut self, pin: Pin) -> bool {
        match lookup(&mut self.inputs, pin).map(InputPin::is_high) {
            Some(Ok(level)) => level,
            Some(Err(e)) => {
                warn!("hal: read of pin {} failed: {:?}", pin, e);
                false
            }
            None => false,
        }
    }

    fn read_analog(&mut self, pin: Pin) -> i32 {
        match lookup(&mut self.analog, pin).map(AnalogSource::read) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                warn!("hal: adc read of pin {} failed: {:?}", pin, e);
                0
            }
            None => 0,
        }
    }

    fn write_digital(&mut self, pin: Pin, high: bool) {
        // PWM-only outputs still accept on/off writes as full duty.
        if let Some(out) = lookup(&mut self.outputs, pin) {
            let res = if high { out.set_high() } else { out.set_low() };
            if let Err(e) = res {
                warn!("hal: write of pin {} failed: {:?}", pin, e);
            }
        } else {
            self.write_analog_level(pin, if high { 255 } else { 0 });
        }
    }

    fn write_analog_level(&mut self, pin: Pin, level: u8) {
        match lookup(&mut self.pwm, pin) {
            Some(pwm) => {
                if let Err(e) = pwm.set_duty_cycle_fraction(u16::from(level), 255) {
                    warn!("hal: duty of pin {} failed: {:?}", pin, e);
                }
            }
            None => warn!("hal: pin {} has no pwm channel", pin),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;

    struct FakeInput(bool);

    impl embedded_hal::digital::ErrorType for FakeInput {
        type Error = Infallible;
    }

    impl InputPin for FakeInput {
        fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[derive(Default)]
    struct FakeOutput(bool);

    impl embedded_hal::digital::ErrorType for FakeOutput {
        type Error = Infallible;
    }

    impl OutputPin for FakeOutput {
        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            self.0 = true;
            Ok(())
        }

        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            self.0 = false;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePwm(u16);

    impl embedded_hal::pwm::ErrorType for FakePwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), Infallible> {
            self.0 = duty;
            Ok(())
        }
    }

    struct FakeAdc(Option<i32>);

    impl AnalogSource for FakeAdc {
        type Error = &'static str;

        fn read(&mut self) -> core::result::Result<i32, &'static str> {
            self.0.ok_or("conversion timeout")
        }
    }

    type Io = HalIo<FakeInput, FakeOutput, FakePwm, FakeAdc, 4>;

    #[test]
    fn reads_route_to_bound_pins() {
        let mut io = Io::new();
        io.bind_input(2, FakeInput(true)).unwrap();
        io.bind_analog(7, FakeAdc(Some(612))).unwrap();
        assert!(io.read_digital(2));
        assert!(!io.read_digital(3));
        assert_eq!(io.read_analog(7), 612);
    }

    #[test]
    fn adc_error_reads_as_zero() {
        let mut io = Io::new();
        io.bind_analog(7, FakeAdc(None)).unwrap();
        assert_eq!(io.read_analog(7), 0);
    }

    #[test]
    fn pwm_level_scales_to_duty() {
        let mut io = Io::new();
        io.bind_pwm(5, FakePwm::default()).unwrap();
        io.write_analog_level(5, 255);
        assert_eq!(lookup(&mut io.pwm, 5).map(|p| p.0), Some(1000));
        io.write_analog_level(5, 51);
        assert_eq!(lookup(&mut io.pwm, 5).map(|p| p.0), Some(200));
    }

    #[test]
    fn digital_write_falls_back_to_pwm() {
        let mut io = Io::new();
        io.bind_output(1, FakeOutput::default()).unwrap();
        io.bind_pwm(5, FakePwm::default()).unwrap();
        io.write_digital(1, true);
        io.write_digital(5, true);
        assert_eq!(lookup(&mut io.outputs, 1).map(|o| o.0), Some(true));
        assert_eq!(lookup(&mut io.pwm, 5).map(|p| p.0), Some(1000));
    }

    #[test]
    fn table_capacity_is_enforced() {
        let mut io = Io::new();
        for pin in 0..4 {
            io.bind_input(pin, FakeInput(false)).unwrap();
        }
        assert!(matches!(
            io.bind_input(9, FakeInput(false)),
            Err(Error::Capacity {
                kind: Peripheral::Input,
                capacity: 4
            })
        ));
    }
}
