//! Sample validity and equipment eligibility rules.
//!
//! Pipeline: Eligibility → Flow-Rate Catalog → Filter Compatibility
//!           → Duration/Volume → Drift/Status → Field Requirements
//!
//! Every function here is pure: inputs in, derived values out. Nothing fails;
//! unusable input resolves to an empty or default result.

mod catalog;
mod compatibility;
mod drift;
mod duration;
mod eligibility;
mod requirements;

pub use catalog::*;
pub use compatibility::*;
pub use drift::*;
pub use duration::*;
pub use eligibility::*;
pub use requirements::*;
