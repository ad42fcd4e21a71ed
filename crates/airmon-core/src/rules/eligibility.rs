//! Calibration eligibility for pumps and flowmeters.
//!
//! Rules, first match wins:
//! 1. No equipment → Out-of-Service
//! 2. Manually marked out-of-service → Out-of-Service
//! 3. No last calibration or no due date → Out-of-Service
//! 4. Flowmeters: due before today → Overdue, else Active
//! 5. Pumps: latest calibration failed every test → Out-of-Service
//! 6. Pumps: no passing calibration inside the window → Out-of-Service
//! 7. Due before today → Overdue
//! 8. Active

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::models::{most_recent_pump, CalibrationHistory, DerivedEquipmentStatus, Equipment};

/// Derive the status of a piece of equipment as of `today`.
pub fn derive_equipment_status(
    equipment: Option<&Equipment>,
    history: &CalibrationHistory,
    today: NaiveDate,
    config: &RulesConfig,
) -> DerivedEquipmentStatus {
    let Some(equipment) = equipment else {
        return DerivedEquipmentStatus::OutOfService;
    };

    if equipment.is_marked_out_of_service() {
        return DerivedEquipmentStatus::OutOfService;
    }

    let (Some(_), Some(due)) = (history.last_calibration(), history.calibration_due()) else {
        return DerivedEquipmentStatus::OutOfService;
    };

    let calibrations = match history {
        CalibrationHistory::Pump(cals) if !equipment.is_flowmeter() => cals,
        _ => return due_status(due, today),
    };

    if most_recent_pump(calibrations).map_or(true, |c| c.all_failed()) {
        return DerivedEquipmentStatus::OutOfService;
    }

    // A window reaching past the calendar has no lower bound
    let window_start = Duration::try_days(config.calibration_window_days)
        .and_then(|window| today.checked_sub_signed(window));
    let passed_in_window = calibrations.iter().any(|c| {
        c.calibration_date
            .is_some_and(|d| window_start.map_or(true, |start| d >= start) && d <= today)
            && c.any_passed()
    });
    if !passed_in_window {
        return DerivedEquipmentStatus::OutOfService;
    }

    due_status(due, today)
}

fn due_status(due: NaiveDate, today: NaiveDate) -> DerivedEquipmentStatus {
    if due < today {
        DerivedEquipmentStatus::CalibrationOverdue
    } else {
        DerivedEquipmentStatus::Active
    }
}

/// Whole days from `today` until `due`. Negative means overdue.
pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    // Both sides are midnight-aligned dates, so the ceiling is exact
    (due - today).num_days()
}

/// Equipment paired with its derived status, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentEligibility {
    pub equipment: Equipment,
    pub status: DerivedEquipmentStatus,
    pub last_calibration: Option<NaiveDate>,
    pub calibration_due: Option<NaiveDate>,
    pub days_until_due: Option<i64>,
}

impl EquipmentEligibility {
    /// Evaluate one piece of equipment against its history.
    pub fn evaluate(
        equipment: Equipment,
        history: &CalibrationHistory,
        today: NaiveDate,
        config: &RulesConfig,
    ) -> Self {
        let status = derive_equipment_status(Some(&equipment), history, today, config);
        let calibration_due = history.calibration_due();
        Self {
            equipment,
            status,
            last_calibration: history.last_calibration(),
            calibration_due,
            days_until_due: calibration_due.map(|due| days_until_due(due, today)),
        }
    }
}
