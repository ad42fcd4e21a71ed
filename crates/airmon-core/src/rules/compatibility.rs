//! Filter size / flow rate compatibility.
//!
//! A 13 mm filter is only run at 1.5 L/min. Every other filter size (and an
//! unselected one) may use any calibrated flow rate except 1.5 L/min.

use crate::config::RulesConfig;
use crate::models::{FilterSize, SampleDraft};

/// Check if a flow rate is the 13 mm flow rate, within tolerance.
pub fn is_13mm_flowrate(rate: f64, config: &RulesConfig) -> bool {
    (rate - config.thirteen_mm_flowrate).abs() <= config.flowrate_epsilon
}

/// Narrow a flow-rate catalog to the rates usable with `filter_size`.
pub fn compatible_flowrates(
    catalog: &[f64],
    filter_size: &FilterSize,
    config: &RulesConfig,
) -> Vec<f64> {
    let want_13mm = filter_size.is_13mm();
    catalog
        .iter()
        .copied()
        .filter(|&rate| is_13mm_flowrate(rate, config) == want_13mm)
        .collect()
}

/// Check if a pump's catalog can serve a 13 mm filter at all.
pub fn supports_13mm(catalog: &[f64], config: &RulesConfig) -> bool {
    catalog.iter().any(|&rate| is_13mm_flowrate(rate, config))
}

/// Reset a 13 mm selection the pump cannot serve.
///
/// Switches the filter to 25 mm and clears all flow-rate fields. Returns
/// whether anything changed.
pub fn reconcile_filter_size(
    draft: &mut SampleDraft,
    catalog: &[f64],
    config: &RulesConfig,
) -> bool {
    if !draft.filter_size.is_13mm() || supports_13mm(catalog, config) {
        return false;
    }
    tracing::debug!(
        sample_id = %draft.sample_id,
        "pump has no 13mm flow rate, switching filter to 25mm"
    );
    draft.filter_size = FilterSize::Mm25;
    draft.clear_flowrates();
    true
}
