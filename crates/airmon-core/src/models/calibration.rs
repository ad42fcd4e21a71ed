//! Calibration records for pumps and flowmeters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates;

/// Calibration results are recorded in mL/min; samples use L/min.
pub const ML_PER_LITRE: f64 = 1000.0;

/// One flow-rate test performed during a pump calibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Flow rate the pump was set to, in mL/min
    pub set_flowrate: f64,
    /// Whether the pump held the set flow rate
    pub passed: bool,
}

impl TestResult {
    pub fn new(set_flowrate: f64, passed: bool) -> Self {
        Self {
            set_flowrate,
            passed,
        }
    }

    /// Set flow rate in L/min.
    pub fn flowrate_lpm(&self) -> f64 {
        self.set_flowrate / ML_PER_LITRE
    }
}

/// A pump calibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PumpCalibration {
    /// Calibration ID
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Day the calibration was performed
    #[serde(default, with = "dates::optional")]
    pub calibration_date: Option<NaiveDate>,
    /// Day after which this calibration no longer counts
    #[serde(default, with = "dates::optional")]
    pub next_calibration_due: Option<NaiveDate>,
    /// Tests in the order they were run
    #[serde(default)]
    pub test_results: Vec<TestResult>,
}

impl PumpCalibration {
    /// Create a calibration with both dates set and no test results.
    pub fn new(calibration_date: NaiveDate, next_calibration_due: NaiveDate) -> Self {
        Self {
            id: None,
            calibration_date: Some(calibration_date),
            next_calibration_due: Some(next_calibration_due),
            test_results: Vec::new(),
        }
    }

    /// Builder-style helper for adding a test result.
    pub fn with_result(mut self, set_flowrate: f64, passed: bool) -> Self {
        self.test_results.push(TestResult::new(set_flowrate, passed));
        self
    }

    /// True when no test in this calibration passed (including no tests at all).
    pub fn all_failed(&self) -> bool {
        self.test_results.iter().all(|r| !r.passed)
    }

    pub fn any_passed(&self) -> bool {
        self.test_results.iter().any(|r| r.passed)
    }
}

/// A flowmeter calibration. Flowmeters have no per-flow-rate tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowmeterCalibration {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, with = "dates::optional")]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "dates::optional")]
    pub next_calibration: Option<NaiveDate>,
}

impl FlowmeterCalibration {
    pub fn new(date: NaiveDate, next_calibration: NaiveDate) -> Self {
        Self {
            id: None,
            date: Some(date),
            next_calibration: Some(next_calibration),
        }
    }
}

/// Calibration history of one piece of equipment, in whichever shape the
/// registry holds for it.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationHistory {
    Pump(Vec<PumpCalibration>),
    Flowmeter(Vec<FlowmeterCalibration>),
}

impl CalibrationHistory {
    pub fn empty_pump() -> Self {
        CalibrationHistory::Pump(Vec::new())
    }

    /// True when this history carries pump-style test results.
    pub fn is_pump_shaped(&self) -> bool {
        matches!(self, CalibrationHistory::Pump(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CalibrationHistory::Pump(cals) => cals.is_empty(),
            CalibrationHistory::Flowmeter(cals) => cals.is_empty(),
        }
    }

    /// Date of the most recent calibration.
    pub fn last_calibration(&self) -> Option<NaiveDate> {
        match self {
            CalibrationHistory::Pump(cals) => cals.iter().filter_map(|c| c.calibration_date).max(),
            CalibrationHistory::Flowmeter(cals) => cals.iter().filter_map(|c| c.date).max(),
        }
    }

    /// Due date carried by the most recent calibration.
    pub fn calibration_due(&self) -> Option<NaiveDate> {
        match self {
            CalibrationHistory::Pump(cals) => {
                most_recent_pump(cals).and_then(|c| c.next_calibration_due)
            }
            CalibrationHistory::Flowmeter(cals) => cals
                .iter()
                .filter(|c| c.date.is_some())
                .max_by_key(|c| c.date)
                .and_then(|c| c.next_calibration),
        }
    }
}

/// Most recent dated pump calibration.
pub fn most_recent_pump(cals: &[PumpCalibration]) -> Option<&PumpCalibration> {
    cals.iter()
        .filter(|c| c.calibration_date.is_some())
        .max_by_key(|c| c.calibration_date)
}

/// Pump calibrations ordered most recent first; undated entries last.
pub fn sorted_most_recent_first(cals: &[PumpCalibration]) -> Vec<&PumpCalibration> {
    let mut sorted: Vec<&PumpCalibration> = cals.iter().collect();
    // Option<NaiveDate> orders None first, so reversing puts undated last
    sorted.sort_by(|a, b| b.calibration_date.cmp(&a.calibration_date));
    sorted
}
