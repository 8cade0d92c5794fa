//! Fatal configuration reporting.
//!
//! Setup errors are programmer errors: the board was built with too few
//! slots, or a handle leaked across reactors. Firmware usually prefers to
//! stop right there instead of running with a half-configured device, so
//! [`OrHalt`] logs the error once through the `log` facade and then
//! panics, which halts (or resets, depending on the panic handler) the
//! target.

use log::error;

use crate::error::{Error, Result};

/// Log `err` once and halt.
#[cold]
pub fn halt(err: Error) -> ! {
    error!("FATAL | {err} | halting");
    panic!("fatal configuration error: {err}");
}

/// Extension for setup results: unwrap or report-and-halt.
pub trait OrHalt<T> {
    /// Return the value, or report the error through [`halt`].
    fn or_halt(self) -> T;
}

impl<T> OrHalt<T> for Result<T> {
    #[track_caller]
    fn or_halt(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => halt(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Peripheral;

    #[test]
    fn ok_passes_through() {
        let r: Result<u8> = Ok(7);
        assert_eq!(r.or_halt(), 7);
    }

    #[test]
    #[should_panic(expected = "fatal configuration error")]
    fn err_halts() {
        let r: Result<u8> = Err(Error::Capacity {
            kind: Peripheral::Output,
            capacity: 2,
        });
        let _ = r.or_halt();
    }
}
