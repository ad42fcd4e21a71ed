//! Domain models for air-monitoring samples and equipment.

mod calibration;
pub mod dates;
mod equipment;
mod sample;

pub use calibration::*;
pub use equipment::*;
pub use sample::*;
