//! Export functionality for sample submission and shift reporting.

mod payload;
mod sheet;

pub use payload::*;
pub use sheet::*;
