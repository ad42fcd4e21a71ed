//! Airmon Core Library
//!
//! Sample validity, flow-rate and equipment-eligibility rules for asbestos
//! air-monitoring forms, with a local SQLite store.
//!
//! # Architecture
//!
//! ```text
//! Equipment registry ──► Eligibility ──► Active pumps / flowmeters
//!                                              │
//!                                        pump selected
//!                                              │
//!                                              ▼
//!                           Flow-rate catalog (current calibration)
//!                                              │
//!                                   Filter compatibility
//!                                              │
//!          user edit ──► SampleForm ──► Duration/Volume ──► Drift/Status
//!                                              │
//!                                     Field requirements
//!                                              │
//!                              ┌───────────────┴───────────────┐
//!                              ▼                               ▼
//!                        SamplePayload                  Shift sample sheet
//!                         (sample API)                     (JSON / CSV)
//! ```
//!
//! # Core Principle
//!
//! **Derived fields are never edited.** Average flow rate, sample status and
//! equipment status are recomputed from their inputs on every change.
//!
//! # Modules
//!
//! - [`rules`]: Pure eligibility, catalog, compatibility, volume, drift and requirement rules
//! - [`form`]: `SampleForm` state transitions and calibration lookups
//! - [`models`]: Domain types (Equipment, PumpCalibration, SampleDraft, etc.)
//! - [`db`]: SQLite store for equipment, calibrations and samples
//! - [`export`]: Submission payload and shift sample sheet
//! - [`config`]: Rule thresholds

pub mod config;
pub mod db;
pub mod export;
pub mod form;
pub mod models;
pub mod rules;

// Re-export commonly used types
pub use config::RulesConfig;
pub use db::Database;
pub use export::{SamplePayload, ShiftSampleSheet};
pub use form::{CalibrationSource, SampleEdit, SampleForm};
pub use models::{
    CalibrationHistory, DerivedEquipmentStatus, Equipment, EquipmentType, FilterSize,
    FlowmeterCalibration, PumpCalibration, SampleDraft, SampleStatus, TestResult,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum AirMonitorError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for AirMonitorError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => AirMonitorError::NotFound(what),
            other => AirMonitorError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AirMonitorError {
    fn from(e: serde_json::Error) -> Self {
        AirMonitorError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for AirMonitorError {
    fn from(e: config::ConfigError) -> Self {
        AirMonitorError::InvalidInput(e.to_string())
    }
}

impl From<form::SubmitError> for AirMonitorError {
    fn from(e: form::SubmitError) -> Self {
        match e {
            form::SubmitError::Invalid(report) => AirMonitorError::ValidationFailed(
                report
                    .errors
                    .values()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for AirMonitorError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        AirMonitorError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<AirMonitorCore>, AirMonitorError> {
    let db = Database::open(&path)?;
    Ok(AirMonitorCore::new(db, RulesConfig::default()))
}

/// Open or create a database with rule thresholds given as JSON.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<AirMonitorCore>, AirMonitorError> {
    let config = RulesConfig::from_json_str(&config_json)?;
    let db = Database::open(&path)?;
    Ok(AirMonitorCore::new(db, config))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<AirMonitorCore>, AirMonitorError> {
    let db = Database::open_in_memory()?;
    Ok(AirMonitorCore::new(db, RulesConfig::default()))
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// `filter` uses `RUST_LOG` syntax, e.g. `"airmon_core=debug"`. Fails if a
/// subscriber is already installed.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<(), AirMonitorError> {
    let filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .map_err(|e| AirMonitorError::InvalidInput(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| AirMonitorError::InvalidInput(format!("logging already initialised: {}", e)))
}

/// Minutes between setup and collection ("HH:MM" times).
#[uniffi::export]
pub fn elapsed_minutes(start_time: String, end_time: String, next_day: bool) -> Option<i64> {
    rules::elapsed_minutes(&start_time, &end_time, next_day)
}

/// Normalize a cowl number to a single "C" prefix.
#[uniffi::export]
pub fn format_cowl_number(raw: String) -> String {
    models::format_cowl_number(&raw)
}

fn resolve_today(today: Option<String>) -> Result<NaiveDate, AirMonitorError> {
    match today {
        Some(s) => models::dates::parse_date(&s)
            .ok_or_else(|| AirMonitorError::InvalidInput(format!("Invalid date: {}", s))),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct AirMonitorCore {
    db: Arc<Mutex<Database>>,
    config: RulesConfig,
}

impl AirMonitorCore {
    fn new(db: Database, config: RulesConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }
}

#[uniffi::export]
impl AirMonitorCore {
    // =========================================================================
    // Equipment Operations
    // =========================================================================

    /// Add or update a piece of equipment.
    pub fn upsert_equipment(&self, equipment: FfiEquipment) -> Result<(), AirMonitorError> {
        let db = self.db.lock()?;
        db.upsert_equipment(&equipment.into())?;
        Ok(())
    }

    /// List equipment, optionally of one type ("Air pump", "Site flowmeter").
    pub fn list_equipment(
        &self,
        equipment_type: Option<String>,
    ) -> Result<Vec<FfiEquipment>, AirMonitorError> {
        let db = self.db.lock()?;
        let equipment_type = equipment_type.map(EquipmentType::from);
        let items = db.list_equipment_by_type(equipment_type.as_ref())?;
        Ok(items.into_iter().map(|e| e.into()).collect())
    }

    /// Set or clear the manual status (e.g. "out-of-service").
    pub fn set_equipment_status(
        &self,
        equipment_id: String,
        status: Option<String>,
    ) -> Result<bool, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.set_equipment_status(&equipment_id, status.as_deref())?)
    }

    /// Record a pump calibration. Returns its ID.
    pub fn add_pump_calibration(
        &self,
        equipment_id: String,
        calibration: FfiPumpCalibration,
    ) -> Result<String, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.insert_pump_calibration(&equipment_id, &calibration.into())?)
    }

    /// Record a flowmeter calibration. Returns its ID.
    pub fn add_flowmeter_calibration(
        &self,
        equipment_id: String,
        calibration: FfiFlowmeterCalibration,
    ) -> Result<String, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.insert_flowmeter_calibration(&equipment_id, &calibration.into())?)
    }

    /// Derived status of one piece of equipment. Unknown IDs are out of service.
    pub fn equipment_status(
        &self,
        equipment_id: String,
        today: Option<String>,
    ) -> Result<String, AirMonitorError> {
        let today = resolve_today(today)?;
        let db = self.db.lock()?;
        let status = match db.get_equipment(&equipment_id)? {
            Some(equipment) => {
                let history = form::fetch_history(&*db, &equipment);
                rules::derive_equipment_status(Some(&equipment), &history, today, &self.config)
            }
            None => DerivedEquipmentStatus::OutOfService,
        };
        Ok(status.as_str().to_string())
    }

    /// Every piece of equipment of a type with its derived status.
    pub fn equipment_statuses(
        &self,
        equipment_type: String,
        today: Option<String>,
    ) -> Result<Vec<FfiEquipmentStatus>, AirMonitorError> {
        let today = resolve_today(today)?;
        let db = self.db.lock()?;
        let entries = form::equipment_statuses(
            &*db,
            &EquipmentType::from(equipment_type),
            today,
            &self.config,
        );
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Pumps that may be picked for a sample.
    pub fn active_pumps(&self, today: Option<String>) -> Result<Vec<FfiEquipment>, AirMonitorError> {
        self.active_of_type(EquipmentType::AirPump, today)
    }

    /// Flowmeters that may be picked for a sample.
    pub fn active_flowmeters(
        &self,
        today: Option<String>,
    ) -> Result<Vec<FfiEquipment>, AirMonitorError> {
        self.active_of_type(EquipmentType::SiteFlowmeter, today)
    }

    /// Flow rates (L/min) selectable for a pump with a filter size.
    pub fn flowrate_options(
        &self,
        pump_id: String,
        filter_size: String,
        today: Option<String>,
    ) -> Result<Vec<f64>, AirMonitorError> {
        let today = resolve_today(today)?;
        let db = self.db.lock()?;
        let calibrations = db.list_pump_calibrations(&pump_id)?;
        let catalog = rules::build_flowrate_catalog(&calibrations, today);
        Ok(rules::compatible_flowrates(
            &catalog,
            &FilterSize::from(filter_size),
            &self.config,
        ))
    }

    // =========================================================================
    // Sample Operations
    // =========================================================================

    /// Average flow rate and status for typed initial/final flow rates.
    pub fn resolve_flowrates(
        &self,
        initial_flowrate: String,
        final_flowrate: String,
    ) -> FfiFlowResolution {
        rules::resolve_flowrates(
            rules::parse_flowrate(&initial_flowrate),
            rules::parse_flowrate(&final_flowrate),
            &self.config,
        )
        .into()
    }

    /// Validate a sample without saving it.
    pub fn validate_sample(
        &self,
        sample: FfiSample,
        collection_edited: bool,
    ) -> FfiValidationReport {
        rules::validate_sample(&sample.into(), collection_edited, &self.config).into()
    }

    /// Validate and save a sample. Derived fields are recomputed first.
    pub fn save_sample(
        &self,
        sample: FfiSample,
        today: Option<String>,
    ) -> Result<FfiSample, AirMonitorError> {
        let today = resolve_today(today)?;
        let db = self.db.lock()?;
        let form = SampleForm::hydrate(&*db, self.config.clone(), today, sample.into());
        form.submit()?;
        let mut draft = form.into_draft();
        draft.touch();
        db.save_sample(&draft)?;
        Ok(draft.into())
    }

    /// Get a sample by ID.
    pub fn get_sample(&self, sample_id: String) -> Result<Option<FfiSample>, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.get_sample(&sample_id)?.map(|s| s.into()))
    }

    /// List the samples of a shift.
    pub fn list_shift_samples(&self, shift_id: String) -> Result<Vec<FfiSample>, AirMonitorError> {
        let db = self.db.lock()?;
        let samples = db.list_samples_for_shift(&shift_id)?;
        Ok(samples.into_iter().map(|s| s.into()).collect())
    }

    /// Delete a sample.
    pub fn delete_sample(&self, sample_id: String) -> Result<bool, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.delete_sample(&sample_id)?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export a shift's samples as CSV.
    pub fn export_shift_csv(&self, shift_id: String) -> Result<String, AirMonitorError> {
        Ok(self.shift_sheet(&shift_id)?.to_csv())
    }

    /// Export a shift's samples as JSON.
    pub fn export_shift_json(&self, shift_id: String) -> Result<String, AirMonitorError> {
        Ok(self.shift_sheet(&shift_id)?.to_json()?)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Create missing indexes. Returns the names created.
    pub fn ensure_indexes(&self) -> Result<Vec<String>, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.ensure_indexes()?)
    }

    /// Names of the indexes present.
    pub fn list_indexes(&self) -> Result<Vec<String>, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.list_indexes()?)
    }

    /// Rebuild every index and refresh statistics.
    pub fn rebuild_indexes(&self) -> Result<u32, AirMonitorError> {
        let db = self.db.lock()?;
        Ok(db.rebuild_indexes()? as u32)
    }
}

impl AirMonitorCore {
    fn active_of_type(
        &self,
        equipment_type: EquipmentType,
        today: Option<String>,
    ) -> Result<Vec<FfiEquipment>, AirMonitorError> {
        let today = resolve_today(today)?;
        let db = self.db.lock()?;
        let items = form::active_equipment(&*db, &equipment_type, today, &self.config);
        Ok(items.into_iter().map(|e| e.into()).collect())
    }

    fn shift_sheet(&self, shift_id: &str) -> Result<ShiftSampleSheet, AirMonitorError> {
        let db = self.db.lock()?;
        let samples = db.list_samples_for_shift(shift_id)?;
        Ok(ShiftSampleSheet::from_samples(shift_id, &samples, &self.config))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe equipment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEquipment {
    pub id: String,
    pub equipment_type: String,
    pub equipment_reference: String,
    pub status: Option<String>,
    pub brand_model: Option<String>,
}

impl From<Equipment> for FfiEquipment {
    fn from(e: Equipment) -> Self {
        Self {
            id: e.id,
            equipment_type: e.equipment_type.into(),
            equipment_reference: e.equipment_reference,
            status: e.status,
            brand_model: e.brand_model,
        }
    }
}

impl From<FfiEquipment> for Equipment {
    fn from(e: FfiEquipment) -> Self {
        Equipment {
            id: e.id,
            equipment_type: EquipmentType::from(e.equipment_type),
            equipment_reference: e.equipment_reference,
            status: e.status,
            brand_model: e.brand_model,
        }
    }
}

/// FFI-safe equipment with derived status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEquipmentStatus {
    pub equipment: FfiEquipment,
    pub status: String,
    pub last_calibration: Option<String>,
    pub calibration_due: Option<String>,
    pub days_until_due: Option<i64>,
}

impl From<rules::EquipmentEligibility> for FfiEquipmentStatus {
    fn from(e: rules::EquipmentEligibility) -> Self {
        Self {
            equipment: e.equipment.into(),
            status: e.status.as_str().to_string(),
            last_calibration: e.last_calibration.map(format_date),
            calibration_due: e.calibration_due.map(format_date),
            days_until_due: e.days_until_due,
        }
    }
}

/// FFI-safe pump calibration test.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTestResult {
    /// mL/min
    pub set_flowrate: f64,
    pub passed: bool,
}

/// FFI-safe pump calibration. Dates are `YYYY-MM-DD` or RFC 3339.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPumpCalibration {
    pub id: Option<String>,
    pub calibration_date: Option<String>,
    pub next_calibration_due: Option<String>,
    pub test_results: Vec<FfiTestResult>,
}

impl From<FfiPumpCalibration> for PumpCalibration {
    fn from(c: FfiPumpCalibration) -> Self {
        PumpCalibration {
            id: c.id,
            calibration_date: c.calibration_date.as_deref().and_then(models::dates::parse_date),
            next_calibration_due: c
                .next_calibration_due
                .as_deref()
                .and_then(models::dates::parse_date),
            test_results: c
                .test_results
                .into_iter()
                .map(|t| TestResult::new(t.set_flowrate, t.passed))
                .collect(),
        }
    }
}

/// FFI-safe flowmeter calibration. Dates are `YYYY-MM-DD` or RFC 3339.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFlowmeterCalibration {
    pub id: Option<String>,
    pub date: Option<String>,
    pub next_calibration: Option<String>,
}

impl From<FfiFlowmeterCalibration> for FlowmeterCalibration {
    fn from(c: FfiFlowmeterCalibration) -> Self {
        FlowmeterCalibration {
            id: c.id,
            date: c.date.as_deref().and_then(models::dates::parse_date),
            next_calibration: c
                .next_calibration
                .as_deref()
                .and_then(models::dates::parse_date),
        }
    }
}

/// FFI-safe derived flow-rate values.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFlowResolution {
    pub average_flowrate: String,
    pub allowed_drift: Option<f64>,
    pub status: String,
}

impl From<rules::FlowResolution> for FfiFlowResolution {
    fn from(r: rules::FlowResolution) -> Self {
        Self {
            average_flowrate: r.average_display,
            allowed_drift: r.allowed_drift,
            status: r.status.as_str().to_string(),
        }
    }
}

/// FFI-safe sample. Times and flow rates are passed as typed.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSample {
    pub sample_id: String,
    pub shift_id: Option<String>,
    pub sampler: String,
    pub sample_number: String,
    pub is_field_blank: bool,
    pub is_neg_air_exhaust: bool,
    pub location: String,
    pub sample_type: String,
    pub pump: Option<String>,
    pub flowmeter: Option<String>,
    pub cowl_number: String,
    pub filter_size: String,
    pub start_time: String,
    pub end_time: String,
    pub next_day: bool,
    pub initial_flowrate: String,
    pub final_flowrate: String,
    pub average_flowrate: String,
    pub notes: String,
    pub status: String,
}

impl From<SampleDraft> for FfiSample {
    fn from(s: SampleDraft) -> Self {
        Self {
            sample_id: s.sample_id,
            shift_id: s.shift_id,
            sampler: s.sampler,
            sample_number: s.sample_number,
            is_field_blank: s.is_field_blank,
            is_neg_air_exhaust: s.is_neg_air_exhaust,
            location: s.location,
            sample_type: s.sample_type,
            pump: s.pump,
            flowmeter: s.flowmeter,
            cowl_number: s.cowl_number,
            filter_size: s.filter_size.into(),
            start_time: s.start_time,
            end_time: s.end_time,
            next_day: s.next_day,
            initial_flowrate: s.initial_flowrate,
            final_flowrate: s.final_flowrate,
            average_flowrate: s.average_flowrate,
            notes: s.notes,
            status: s.status.as_str().to_string(),
        }
    }
}

impl From<FfiSample> for SampleDraft {
    fn from(s: FfiSample) -> Self {
        let mut draft = SampleDraft::new(s.shift_id);
        if !s.sample_id.trim().is_empty() {
            draft.sample_id = s.sample_id;
        }
        draft.sampler = s.sampler;
        draft.sample_number = s.sample_number;
        draft.is_field_blank = s.is_field_blank;
        draft.is_neg_air_exhaust = s.is_neg_air_exhaust;
        draft.location = s.location;
        draft.sample_type = s.sample_type;
        draft.pump = s.pump;
        draft.flowmeter = s.flowmeter;
        draft.cowl_number = s.cowl_number;
        draft.filter_size = FilterSize::from(s.filter_size);
        draft.start_time = s.start_time;
        draft.end_time = s.end_time;
        draft.next_day = s.next_day;
        draft.initial_flowrate = s.initial_flowrate;
        draft.final_flowrate = s.final_flowrate;
        draft.average_flowrate = s.average_flowrate;
        draft.notes = s.notes;
        draft.status = if s.status == SampleStatus::Failed.as_str() {
            SampleStatus::Failed
        } else {
            SampleStatus::Pending
        };
        draft
    }
}

/// FFI-safe field error.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldError {
    pub field: String,
    pub message: String,
}

/// FFI-safe insufficient-sample-time warning.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInsufficientSampleTime {
    pub minutes: i64,
    pub volume: f64,
    pub minimum_volume: f64,
}

/// FFI-safe validation report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiValidationReport {
    pub is_valid: bool,
    pub errors: Vec<FfiFieldError>,
    pub insufficient_sample_time: Option<FfiInsufficientSampleTime>,
}

impl From<rules::ValidationReport> for FfiValidationReport {
    fn from(report: rules::ValidationReport) -> Self {
        Self {
            is_valid: report.is_valid(),
            errors: report
                .errors
                .into_iter()
                .map(|(field, message)| FfiFieldError {
                    field: field.as_str().to_string(),
                    message,
                })
                .collect(),
            insufficient_sample_time: report.insufficient_sample_time.map(|w| {
                FfiInsufficientSampleTime {
                    minutes: w.minutes,
                    volume: w.volume,
                    minimum_volume: w.minimum_volume,
                }
            }),
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
