//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter | Implements   | Connects to                               |
//! |---------|--------------|-------------------------------------------|
//! | `sim`   | HardwareIo   | In-memory pin levels and write history    |
//! | `hal`   | HardwareIo   | `embedded-hal` 1.0 pins and PWM channels  |
//! | `time`  | Clock        | Manual, `std` and embassy time sources    |

pub mod hal;
pub mod sim;
pub mod time;
