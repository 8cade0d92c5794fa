//! Analog input pipeline: smoothing, range mapping, stabilization and zone
//! classification.

pub mod analog;
pub mod preset;
pub mod stabilizer;
pub mod zones;
