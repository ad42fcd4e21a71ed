//! Calibration lookups and the per-form calibration cache.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{
    CalibrationHistory, Equipment, EquipmentType, FlowmeterCalibration, PumpCalibration,
};

/// Lookup errors from an equipment/calibration source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Where equipment and calibration records come from.
///
/// The local [`Database`](crate::db::Database) implements this; a shell can
/// also back it with the remote equipment API.
pub trait CalibrationSource {
    /// List equipment, optionally restricted to one type.
    fn list_equipment(&self, equipment_type: Option<&EquipmentType>)
        -> SourceResult<Vec<Equipment>>;

    /// Pump calibrations for one piece of equipment.
    fn pump_calibrations(&self, equipment_id: &str) -> SourceResult<Vec<PumpCalibration>>;

    /// Flowmeter calibrations for one piece of equipment.
    fn flowmeter_calibrations(&self, equipment_id: &str)
        -> SourceResult<Vec<FlowmeterCalibration>>;
}

/// Fetch the history matching an equipment's type.
///
/// A failed lookup is logged and yields an empty history, which the
/// eligibility rules treat as out of service.
pub fn fetch_history(source: &dyn CalibrationSource, equipment: &Equipment) -> CalibrationHistory {
    if equipment.is_flowmeter() {
        match source.flowmeter_calibrations(&equipment.id) {
            Ok(cals) => CalibrationHistory::Flowmeter(cals),
            Err(e) => {
                tracing::warn!(equipment_id = %equipment.id, error = %e, "flowmeter calibration lookup failed");
                CalibrationHistory::Flowmeter(Vec::new())
            }
        }
    } else {
        match source.pump_calibrations(&equipment.id) {
            Ok(cals) => CalibrationHistory::Pump(cals),
            Err(e) => {
                tracing::warn!(equipment_id = %equipment.id, error = %e, "pump calibration lookup failed");
                CalibrationHistory::empty_pump()
            }
        }
    }
}

/// Pump calibrations fetched during one form session, keyed by equipment ID.
///
/// Entries never change once stored: calibration history is immutable for
/// the life of a form. Failed lookups are not stored, so the next selection
/// of that pump tries again.
#[derive(Debug, Default)]
pub struct CalibrationCache {
    pumps: HashMap<String, Vec<PumpCalibration>>,
}

impl CalibrationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached calibrations for a pump, fetching on first use.
    pub fn get_or_fetch(
        &mut self,
        source: &dyn CalibrationSource,
        equipment_id: &str,
    ) -> &[PumpCalibration] {
        if !self.pumps.contains_key(equipment_id) {
            match source.pump_calibrations(equipment_id) {
                Ok(cals) => {
                    tracing::debug!(equipment_id, count = cals.len(), "cached pump calibrations");
                    self.pumps.insert(equipment_id.to_string(), cals);
                }
                Err(e) => {
                    tracing::warn!(equipment_id, error = %e, "pump calibration lookup failed");
                    return &[];
                }
            }
        }
        self.pumps
            .get(equipment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
