//! Calibration record operations.
//!
//! Calibrations are append-only. Dates are stored as `YYYY-MM-DD`; a stored
//! value that no longer parses reads back as absent.

use chrono::NaiveDate;
use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::form::{CalibrationSource, SourceResult};
use crate::models::{
    dates, sorted_most_recent_first, Equipment, EquipmentType, FlowmeterCalibration,
    PumpCalibration, TestResult,
};

impl Database {
    /// Record a pump calibration. Returns the stored calibration ID.
    pub fn insert_pump_calibration(
        &self,
        equipment_id: &str,
        calibration: &PumpCalibration,
    ) -> DbResult<String> {
        self.require_equipment(equipment_id)?;
        let id = calibration
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let test_results_json = serde_json::to_string(&calibration.test_results)?;

        self.conn.execute(
            r#"
            INSERT INTO pump_calibrations (
                id, equipment_id, calibration_date, next_calibration_due, test_results
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                id,
                equipment_id,
                date_to_string(calibration.calibration_date),
                date_to_string(calibration.next_calibration_due),
                test_results_json,
            ],
        )?;
        Ok(id)
    }

    /// Pump calibrations for one piece of equipment, most recent first.
    pub fn list_pump_calibrations(&self, equipment_id: &str) -> DbResult<Vec<PumpCalibration>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, calibration_date, next_calibration_due, test_results
            FROM pump_calibrations
            WHERE equipment_id = ?
            "#,
        )?;

        let rows = stmt.query_map([equipment_id], |row| {
            Ok(PumpCalibrationRow {
                id: row.get(0)?,
                calibration_date: row.get(1)?,
                next_calibration_due: row.get(2)?,
                test_results: row.get(3)?,
            })
        })?;

        let mut calibrations: Vec<PumpCalibration> = Vec::new();
        for row in rows {
            calibrations.push(row?.try_into()?);
        }

        // Stored dates are text, so order after parsing
        Ok(sorted_most_recent_first(&calibrations)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Record a flowmeter calibration. Returns the stored calibration ID.
    pub fn insert_flowmeter_calibration(
        &self,
        equipment_id: &str,
        calibration: &FlowmeterCalibration,
    ) -> DbResult<String> {
        self.require_equipment(equipment_id)?;
        let id = calibration
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.conn.execute(
            r#"
            INSERT INTO flowmeter_calibrations (id, equipment_id, date, next_calibration)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                id,
                equipment_id,
                date_to_string(calibration.date),
                date_to_string(calibration.next_calibration),
            ],
        )?;
        Ok(id)
    }

    /// Flowmeter calibrations for one piece of equipment, most recent first.
    pub fn list_flowmeter_calibrations(
        &self,
        equipment_id: &str,
    ) -> DbResult<Vec<FlowmeterCalibration>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, date, next_calibration
            FROM flowmeter_calibrations
            WHERE equipment_id = ?
            "#,
        )?;

        let rows = stmt.query_map([equipment_id], |row| {
            let id: String = row.get(0)?;
            let date: Option<String> = row.get(1)?;
            let next: Option<String> = row.get(2)?;
            Ok(FlowmeterCalibration {
                id: Some(id),
                date: date.as_deref().and_then(dates::parse_date),
                next_calibration: next.as_deref().and_then(dates::parse_date),
            })
        })?;

        let mut calibrations = rows.collect::<Result<Vec<_>, _>>()?;
        calibrations.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(calibrations)
    }
}

impl Database {
    fn require_equipment(&self, equipment_id: &str) -> DbResult<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM equipment WHERE id = ?)",
            [equipment_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(DbError::NotFound(format!("equipment {}", equipment_id)))
        }
    }
}

impl CalibrationSource for Database {
    fn list_equipment(&self, equipment_type: Option<&EquipmentType>) -> SourceResult<Vec<Equipment>> {
        Ok(self.list_equipment_by_type(equipment_type)?)
    }

    fn pump_calibrations(&self, equipment_id: &str) -> SourceResult<Vec<PumpCalibration>> {
        Ok(self.list_pump_calibrations(equipment_id)?)
    }

    fn flowmeter_calibrations(&self, equipment_id: &str) -> SourceResult<Vec<FlowmeterCalibration>> {
        Ok(self.list_flowmeter_calibrations(equipment_id)?)
    }
}

/// Intermediate row struct for database mapping.
struct PumpCalibrationRow {
    id: String,
    calibration_date: Option<String>,
    next_calibration_due: Option<String>,
    test_results: String,
}

impl TryFrom<PumpCalibrationRow> for PumpCalibration {
    type Error = DbError;

    fn try_from(row: PumpCalibrationRow) -> Result<Self, Self::Error> {
        let test_results: Vec<TestResult> = serde_json::from_str(&row.test_results)?;

        Ok(PumpCalibration {
            id: Some(row.id),
            calibration_date: row.calibration_date.as_deref().and_then(dates::parse_date),
            next_calibration_due: row
                .next_calibration_due
                .as_deref()
                .and_then(dates::parse_date),
            test_results,
        })
    }
}

fn date_to_string(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}
