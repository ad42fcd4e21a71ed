//! Flow-rate drift and sample status.
//!
//! A sample passes when the final flow rate is within a fraction (10% by
//! default) of the initial flow rate. The boundary is inclusive.

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::models::{SampleDraft, SampleStatus};

/// Absorbs binary rounding so that a drift of exactly the tolerance passes.
const DRIFT_EPSILON: f64 = 1e-9;

/// An average within this of its one-decimal rounding counts as one decimal.
const DISPLAY_EPSILON: f64 = 1e-9;

/// Parse a typed flow rate. Anything that is not a positive number is absent.
pub fn parse_flowrate(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Derived flow-rate values for a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResolution {
    /// Unrounded average, when both flow rates are usable
    pub average: Option<f64>,
    /// Average as shown and stored; empty when not computable
    pub average_display: String,
    /// Largest drift that still passes
    pub allowed_drift: Option<f64>,
    pub status: SampleStatus,
}

impl FlowResolution {
    fn absent() -> Self {
        Self {
            average: None,
            average_display: String::new(),
            allowed_drift: None,
            status: SampleStatus::Pending,
        }
    }
}

/// Resolve average and status from the initial and final flow rates.
pub fn resolve_flowrates(
    initial: Option<f64>,
    final_: Option<f64>,
    config: &RulesConfig,
) -> FlowResolution {
    let (Some(initial), Some(final_)) = (initial, final_) else {
        return FlowResolution::absent();
    };
    if !(initial > 0.0 && final_ > 0.0 && initial.is_finite() && final_.is_finite()) {
        return FlowResolution::absent();
    }

    let average = (initial + final_) / 2.0;
    let allowed_drift = initial * config.drift_tolerance_fraction;
    let status = if (initial - final_).abs() <= allowed_drift + DRIFT_EPSILON {
        SampleStatus::Pending
    } else {
        SampleStatus::Failed
    };

    FlowResolution {
        average: Some(average),
        average_display: format_average(average),
        allowed_drift: Some(allowed_drift),
        status,
    }
}

/// Format an average flow rate: one decimal when that is exact, else two.
pub fn format_average(average: f64) -> String {
    let one_decimal = (average * 10.0).round() / 10.0;
    if (one_decimal - average).abs() < DISPLAY_EPSILON {
        format!("{:.1}", average)
    } else {
        format!("{:.2}", average)
    }
}

/// Recompute `average_flowrate` and `status` on a draft from its typed flow
/// rates. Returns whether either derived field changed.
pub fn apply_flow_resolution(draft: &mut SampleDraft, config: &RulesConfig) -> bool {
    let resolution = resolve_flowrates(
        parse_flowrate(&draft.initial_flowrate),
        parse_flowrate(&draft.final_flowrate),
        config,
    );
    let changed =
        draft.average_flowrate != resolution.average_display || draft.status != resolution.status;
    draft.average_flowrate = resolution.average_display;
    draft.status = resolution.status;
    changed
}
