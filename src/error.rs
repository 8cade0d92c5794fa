//! Unified error type for setup-time failures.
//!
//! Only configuration mistakes are errors: running out of slots, using a
//! handle the registry never issued, or supplying nonsensical parameters.
//! Sampling noise (bounces, sub-threshold drift) is never an error; the
//! state machines absorb it silently. All variants are `Copy` so they can
//! be passed around and logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Peripheral kinds
// ---------------------------------------------------------------------------

/// Which fixed-capacity table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Output,
    Input,
    Encoder,
    Analog,
    Interval,
    Zone,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output => write!(f, "output"),
            Self::Input => write!(f, "digital input"),
            Self::Encoder => write!(f, "rotary encoder"),
            Self::Analog => write!(f, "analog channel"),
            Self::Interval => write!(f, "interval"),
            Self::Zone => write!(f, "zone"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible setup operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A fixed-capacity table is full. Raise the capacity at build time.
    Capacity { kind: Peripheral, capacity: usize },
    /// A handle does not refer to a registered slot.
    InvalidHandle { kind: Peripheral, index: usize },
    /// A zone was declared with `min > max`.
    InvalidZone { min: i32, max: i32 },
    /// Configuration values are inconsistent.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity { kind, capacity } => {
                write!(f, "all {capacity} {kind} slots used; increase the capacity")
            }
            Self::InvalidHandle { kind, index } => write!(f, "invalid {kind} handle {index}"),
            Self::InvalidZone { min, max } => {
                write!(f, "zone min {min} must be <= max {max}")
            }
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_the_table() {
        let e = Error::Capacity {
            kind: Peripheral::Interval,
            capacity: 4,
        };
        assert_eq!(
            e.to_string(),
            "all 4 interval slots used; increase the capacity"
        );
    }

    #[test]
    fn converts_into_anyhow() {
        fn setup() -> anyhow::Result<()> {
            Err(Error::Config("encoder debounce exceeds button debounce"))?;
            Ok(())
        }
        let err = setup().unwrap_err();
        assert!(err.to_string().contains("encoder debounce"));
    }
}
