//! DeviceReactor: cooperative polling event framework for small boards.
//!
//! Buttons, rotary encoders, analog controls, LEDs and software timers are
//! registered on a [`Reactor`] and advanced by calling
//! [`Reactor::update`] from the main loop. Raw samples come in through the
//! [`HardwareIo`] port and timestamps through the [`Clock`] port, so the
//! state machines run unchanged on the host against
//! [`adapters::sim::SimHardware`].
//!
//! ```no_run
//! use devicereactor::adapters::sim::SimHardware;
//! use devicereactor::adapters::time::StdClock;
//! use devicereactor::{ActiveLevel, Reactor};
//!
//! #[derive(Default)]
//! struct App {
//!     presses: u32,
//! }
//!
//! let mut reactor: Reactor<SimHardware, StdClock, App> =
//!     Reactor::new(SimHardware::new(), StdClock::new());
//! let led = reactor.new_output(13).unwrap();
//! let button = reactor.new_input(2, ActiveLevel::PullUp).unwrap();
//! reactor.input(button).unwrap().on_press(|app| app.presses += 1);
//! reactor.output(led).unwrap().blink(500);
//!
//! let mut app = App::default();
//! loop {
//!     reactor.update(&mut app);
//! }
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod ports;
pub mod reactor;
pub mod scheduler;
pub mod sensors;
pub mod time;

pub use config::ReactorConfig;
pub use drivers::button::{ActiveLevel, InputEvent};
pub use drivers::encoder::Rotation;
pub use error::{Error, Result};
pub use ports::{Clock, HardwareIo, Pin};
pub use reactor::{AnalogId, EncoderId, InputId, OutputId, OutputRef, Reactor};
pub use scheduler::{Fired, IntervalId, Intervals};
pub use sensors::preset::Preset;
pub use time::Ticks;
