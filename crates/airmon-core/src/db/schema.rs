//! SQLite schema definition.

/// Tables for the local air-monitoring store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Equipment Registry
-- ============================================================================

CREATE TABLE IF NOT EXISTS equipment (
    id TEXT PRIMARY KEY,
    equipment_type TEXT NOT NULL,                -- 'Air pump', 'Site flowmeter', ...
    equipment_reference TEXT NOT NULL,
    status TEXT,                                 -- only 'out-of-service' is meaningful
    brand_model TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Calibrations (immutable once recorded)
-- ============================================================================

CREATE TABLE IF NOT EXISTS pump_calibrations (
    id TEXT PRIMARY KEY,
    equipment_id TEXT NOT NULL REFERENCES equipment(id) ON DELETE CASCADE,
    calibration_date TEXT,                       -- YYYY-MM-DD
    next_calibration_due TEXT,                   -- YYYY-MM-DD
    test_results TEXT NOT NULL DEFAULT '[]',     -- JSON array of {setFlowrate, passed}
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS flowmeter_calibrations (
    id TEXT PRIMARY KEY,
    equipment_id TEXT NOT NULL REFERENCES equipment(id) ON DELETE CASCADE,
    date TEXT,                                   -- YYYY-MM-DD
    next_calibration TEXT,                       -- YYYY-MM-DD
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Samples
-- ============================================================================

CREATE TABLE IF NOT EXISTS samples (
    sample_id TEXT PRIMARY KEY,
    shift_id TEXT,
    sampler TEXT NOT NULL DEFAULT '',
    sample_number TEXT NOT NULL DEFAULT '',
    is_field_blank INTEGER NOT NULL DEFAULT 0,
    is_neg_air_exhaust INTEGER NOT NULL DEFAULT 0,
    location TEXT NOT NULL DEFAULT '',
    sample_type TEXT NOT NULL DEFAULT '',
    pump TEXT,
    flowmeter TEXT,
    cowl_number TEXT NOT NULL DEFAULT '',
    filter_size TEXT NOT NULL DEFAULT '',
    start_time TEXT NOT NULL DEFAULT '',
    end_time TEXT NOT NULL DEFAULT '',
    next_day INTEGER NOT NULL DEFAULT 0,
    initial_flowrate TEXT NOT NULL DEFAULT '',
    final_flowrate TEXT NOT NULL DEFAULT '',
    average_flowrate TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'failed')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Secondary indexes. Kept apart from [`SCHEMA`] so maintenance can re-apply
/// them on an existing database.
pub const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_equipment_type ON equipment(equipment_type);
CREATE INDEX IF NOT EXISTS idx_equipment_reference ON equipment(equipment_reference);
CREATE INDEX IF NOT EXISTS idx_pump_cal_equipment ON pump_calibrations(equipment_id, calibration_date);
CREATE INDEX IF NOT EXISTS idx_flowmeter_cal_equipment ON flowmeter_calibrations(equipment_id, date);
CREATE INDEX IF NOT EXISTS idx_samples_shift ON samples(shift_id);
CREATE INDEX IF NOT EXISTS idx_samples_status ON samples(status);
"#;

/// Names of the indexes in [`INDEXES`].
pub const INDEX_NAMES: &[&str] = &[
    "idx_equipment_type",
    "idx_equipment_reference",
    "idx_pump_cal_equipment",
    "idx_flowmeter_cal_equipment",
    "idx_samples_shift",
    "idx_samples_status",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
        let result = conn.execute_batch(INDEXES);
        assert!(result.is_ok(), "Indexes should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_index_names_match() {
        for name in INDEX_NAMES {
            assert!(INDEXES.contains(name), "{} missing from INDEXES", name);
        }
        assert_eq!(INDEXES.matches("CREATE INDEX").count(), INDEX_NAMES.len());
    }

    #[test]
    fn test_status_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO samples (sample_id, status) VALUES ('s1', 'archived')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_calibration_requires_equipment() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO pump_calibrations (id, equipment_id) VALUES ('c1', 'missing')",
            [],
        );
        assert!(result.is_err());
    }
}
