//! Flow-rate catalog: which flow rates a pump is calibrated for right now.

use chrono::NaiveDate;

use crate::models::{sorted_most_recent_first, PumpCalibration};

/// Two catalog entries closer than this are the same flow rate.
const DEDUP_EPSILON: f64 = 1e-9;

/// The calibration currently in force: the most recent one whose due date
/// has not passed.
pub fn current_calibration(
    calibrations: &[PumpCalibration],
    today: NaiveDate,
) -> Option<&PumpCalibration> {
    sorted_most_recent_first(calibrations)
        .into_iter()
        .find(|c| c.next_calibration_due.is_some_and(|due| due >= today))
}

/// Build the sorted, de-duplicated list of passed flow rates (L/min) from
/// the calibration currently in force.
pub fn build_flowrate_catalog(calibrations: &[PumpCalibration], today: NaiveDate) -> Vec<f64> {
    let Some(current) = current_calibration(calibrations, today) else {
        return Vec::new();
    };

    let mut rates: Vec<f64> = current
        .test_results
        .iter()
        .filter(|r| r.passed)
        .map(|r| r.flowrate_lpm())
        .filter(|r| r.is_finite())
        .collect();

    rates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    rates.dedup_by(|a, b| (*a - *b).abs() < DEDUP_EPSILON);
    rates
}
