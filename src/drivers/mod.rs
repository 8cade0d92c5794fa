//! Peripheral drivers: debounced inputs, rotary encoders and illumination
//! outputs with their animation engine.

pub mod animation;
pub mod button;
pub mod encoder;
pub mod led;
