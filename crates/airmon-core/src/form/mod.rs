//! Sample form driver.
//!
//! `SampleForm` owns one draft and applies user edits as explicit state
//! transitions. After every edit the derived fields are recomputed once:
//!
//! ```text
//! SampleEdit ──► apply field ──► cowl + category defaults
//!                                          │
//!                                filter/pump reconcile
//!                                          │
//!                                          ▼
//!                                 average + status
//! ```

mod cache;
mod options;

pub use cache::*;
pub use options::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::RulesConfig;
use crate::export::SamplePayload;
use crate::models::{format_cowl_number, FilterSize, SampleCategory, SampleDraft};
use crate::rules::{
    apply_flow_resolution, build_flowrate_catalog, compatible_flowrates, elapsed_minutes,
    enforce_category_defaults, reconcile_filter_size, set_field_blank, set_neg_air_exhaust,
    validate_sample, ValidationReport,
};

/// Submission errors.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Sample has {} invalid field(s)", .0.errors.len())]
    Invalid(ValidationReport),
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleEdit {
    Sampler(String),
    SampleNumber(String),
    FieldBlank(bool),
    NegAirExhaust(bool),
    Location(String),
    SampleType(String),
    Pump(Option<String>),
    Flowmeter(Option<String>),
    CowlNumber(String),
    FilterSize(FilterSize),
    StartTime(String),
    EndTime(String),
    NextDay(bool),
    InitialFlowrate(String),
    FinalFlowrate(String),
    Notes(String),
}

impl SampleEdit {
    /// Edits that belong to the collection phase of a sample.
    fn is_collection_field(&self) -> bool {
        matches!(
            self,
            SampleEdit::EndTime(_) | SampleEdit::FinalFlowrate(_) | SampleEdit::NextDay(_)
        )
    }
}

/// One open new/edit sample form.
pub struct SampleForm<'a> {
    source: &'a dyn CalibrationSource,
    config: RulesConfig,
    today: NaiveDate,
    draft: SampleDraft,
    cache: CalibrationCache,
    catalog: Vec<f64>,
    collection_edited: bool,
}

impl<'a> SampleForm<'a> {
    /// Open a form for a new sample.
    pub fn new(
        source: &'a dyn CalibrationSource,
        config: RulesConfig,
        today: NaiveDate,
        shift_id: Option<String>,
    ) -> Self {
        Self {
            source,
            config,
            today,
            draft: SampleDraft::new(shift_id),
            cache: CalibrationCache::new(),
            catalog: Vec::new(),
            collection_edited: false,
        }
    }

    /// Open a form on a persisted sample.
    ///
    /// A sample that already has collection data starts with the collection
    /// fields required.
    pub fn hydrate(
        source: &'a dyn CalibrationSource,
        config: RulesConfig,
        today: NaiveDate,
        mut draft: SampleDraft,
    ) -> Self {
        // Only standard samples carry flow rates
        if draft.category() != SampleCategory::Standard {
            draft.clear_flowrates();
        }
        let collection_edited = !draft.end_time.trim().is_empty()
            || !draft.final_flowrate.trim().is_empty()
            || draft.next_day;
        let pump = draft.pump.clone();

        let mut form = Self {
            source,
            config,
            today,
            draft,
            cache: CalibrationCache::new(),
            catalog: Vec::new(),
            collection_edited,
        };
        form.load_catalog(pump.as_deref());
        form.recompute();
        form
    }

    /// Apply one edit and recompute every derived field.
    pub fn apply(&mut self, edit: SampleEdit) {
        if edit.is_collection_field() {
            self.collection_edited = true;
        }
        let category = self.draft.category();

        match edit {
            SampleEdit::Sampler(v) => self.draft.sampler = v,
            SampleEdit::SampleNumber(v) => self.draft.sample_number = v,
            SampleEdit::FieldBlank(on) => set_field_blank(&mut self.draft, on, &self.config),
            SampleEdit::NegAirExhaust(on) => {
                set_neg_air_exhaust(&mut self.draft, on, &self.config)
            }
            SampleEdit::Location(v) => self.draft.location = v,
            SampleEdit::SampleType(v) => self.draft.sample_type = v,
            SampleEdit::Pump(pump) => {
                let pump = pump.filter(|p| !p.trim().is_empty());
                self.load_catalog(pump.as_deref());
                self.draft.pump = pump;
            }
            SampleEdit::Flowmeter(v) => self.draft.flowmeter = v.filter(|f| !f.trim().is_empty()),
            SampleEdit::CowlNumber(v) => self.draft.cowl_number = v,
            SampleEdit::FilterSize(size) => self.draft.filter_size = size,
            SampleEdit::StartTime(v) => self.draft.start_time = v,
            SampleEdit::EndTime(v) => self.draft.end_time = v,
            SampleEdit::NextDay(on) => self.draft.next_day = on,
            SampleEdit::InitialFlowrate(v) | SampleEdit::FinalFlowrate(v)
                if category != SampleCategory::Standard =>
            {
                tracing::debug!(value = %v, ?category, "ignoring flow rate on non-standard sample");
            }
            SampleEdit::InitialFlowrate(v) => self.draft.initial_flowrate = v,
            SampleEdit::FinalFlowrate(v) => self.draft.final_flowrate = v,
            SampleEdit::Notes(v) => self.draft.notes = v,
        }

        self.recompute();
        self.draft.touch();
    }

    fn load_catalog(&mut self, pump: Option<&str>) {
        self.catalog = match pump {
            Some(id) => build_flowrate_catalog(self.cache.get_or_fetch(self.source, id), self.today),
            None => Vec::new(),
        };
        tracing::debug!(pump = ?pump, rates = ?self.catalog, "rebuilt flow-rate catalog");
    }

    fn recompute(&mut self) {
        self.draft.cowl_number = format_cowl_number(&self.draft.cowl_number);
        enforce_category_defaults(&mut self.draft, &self.config);
        if self.draft.pump.is_some() {
            reconcile_filter_size(&mut self.draft, &self.catalog, &self.config);
        }
        apply_flow_resolution(&mut self.draft, &self.config);
    }

    pub fn draft(&self) -> &SampleDraft {
        &self.draft
    }

    pub fn into_draft(self) -> SampleDraft {
        self.draft
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Whether any collection field has been touched (or was loaded).
    pub fn collection_edited(&self) -> bool {
        self.collection_edited
    }

    /// Every passed flow rate of the selected pump's current calibration.
    pub fn flowrate_catalog(&self) -> &[f64] {
        &self.catalog
    }

    /// Flow rates selectable with the current filter size.
    pub fn flowrate_options(&self) -> Vec<f64> {
        compatible_flowrates(&self.catalog, &self.draft.filter_size, &self.config)
    }

    pub fn elapsed_minutes(&self) -> Option<i64> {
        elapsed_minutes(&self.draft.start_time, &self.draft.end_time, self.draft.next_day)
    }

    pub fn validate(&self) -> ValidationReport {
        validate_sample(&self.draft, self.collection_edited, &self.config)
    }

    /// Validate and build the payload for the sample API.
    pub fn submit(&self) -> Result<SamplePayload, SubmitError> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(SubmitError::Invalid(report));
        }
        Ok(SamplePayload::from_draft(&self.draft, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PumpCalibration, SampleStatus};
    use super::cache::tests::StubSource;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn source() -> StubSource {
        let mut source = StubSource::default();
        let valid = PumpCalibration::new(today() - Duration::days(10), today() + Duration::days(300));
        source.pumps.insert(
            "with-13mm".into(),
            vec![valid
                .clone()
                .with_result(1500.0, true)
                .with_result(2000.0, true)
                .with_result(4000.0, true)],
        );
        source.pumps.insert(
            "no-13mm".into(),
            vec![valid.with_result(2000.0, true).with_result(3000.0, true)],
        );
        source
    }

    fn filled(form: &mut SampleForm<'_>) {
        form.apply(SampleEdit::Sampler("J. Doe".into()));
        form.apply(SampleEdit::SampleNumber("AM-001".into()));
        form.apply(SampleEdit::Location("Basement".into()));
        form.apply(SampleEdit::SampleType("Background".into()));
        form.apply(SampleEdit::Pump(Some("with-13mm".into())));
        form.apply(SampleEdit::Flowmeter(Some("fm-1".into())));
        form.apply(SampleEdit::FilterSize(FilterSize::Mm25));
        form.apply(SampleEdit::StartTime("07:00".into()));
        form.apply(SampleEdit::InitialFlowrate("2.0".into()));
    }

    #[test]
    fn test_pump_selection_builds_options() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        assert!(form.flowrate_options().is_empty());

        form.apply(SampleEdit::Pump(Some("with-13mm".into())));
        assert_eq!(form.flowrate_catalog(), &[1.5, 2.0, 4.0]);
        assert_eq!(form.flowrate_options(), vec![2.0, 4.0]);

        form.apply(SampleEdit::FilterSize(FilterSize::Mm13));
        assert_eq!(form.flowrate_options(), vec![1.5]);
    }

    #[test]
    fn test_reselecting_pump_uses_cache() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        form.apply(SampleEdit::Pump(Some("with-13mm".into())));
        form.apply(SampleEdit::Pump(Some("no-13mm".into())));
        form.apply(SampleEdit::Pump(Some("with-13mm".into())));
        assert_eq!(source.pump_lookups.get(), 2);
    }

    #[test]
    fn test_pump_without_13mm_resets_filter() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        form.apply(SampleEdit::Pump(Some("with-13mm".into())));
        form.apply(SampleEdit::FilterSize(FilterSize::Mm13));
        form.apply(SampleEdit::InitialFlowrate("1.5".into()));

        form.apply(SampleEdit::Pump(Some("no-13mm".into())));
        assert_eq!(form.draft().filter_size, FilterSize::Mm25);
        assert!(form.draft().initial_flowrate.is_empty());
        assert_eq!(form.flowrate_options(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_derived_fields_follow_flowrates() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        form.apply(SampleEdit::InitialFlowrate("2.0".into()));
        assert_eq!(form.draft().average_flowrate, "");

        form.apply(SampleEdit::FinalFlowrate("1.6".into()));
        assert_eq!(form.draft().average_flowrate, "1.8");
        assert_eq!(form.draft().status, SampleStatus::Failed);

        form.apply(SampleEdit::FinalFlowrate("1.9".into()));
        assert_eq!(form.draft().average_flowrate, "1.95");
        assert_eq!(form.draft().status, SampleStatus::Pending);
    }

    #[test]
    fn test_collection_latch() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        filled(&mut form);
        assert!(form.validate().is_valid());
        assert!(!form.collection_edited());

        form.apply(SampleEdit::EndTime("09:00".into()));
        assert!(form.collection_edited());
        let report = form.validate();
        assert!(report
            .error_for(crate::rules::SampleField::FinalFlowrate)
            .is_some());
    }

    #[test]
    fn test_submit() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), Some("s-1".into()));
        assert!(matches!(form.submit(), Err(SubmitError::Invalid(_))));

        filled(&mut form);
        form.apply(SampleEdit::CowlNumber("42".into()));
        form.apply(SampleEdit::EndTime("11:00".into()));
        form.apply(SampleEdit::FinalFlowrate("2.0".into()));

        let payload = form.submit().unwrap();
        assert_eq!(payload.cowl_number, "C42");
        assert_eq!(payload.average_flowrate, Some(2.0));
        assert_eq!(payload.status, SampleStatus::Pending);
        assert_eq!(payload.shift_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn test_neg_air_exhaust_ignores_flowrate_edits() {
        let source = source();
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        form.apply(SampleEdit::InitialFlowrate("2.0".into()));
        form.apply(SampleEdit::NegAirExhaust(true));
        assert!(form.draft().initial_flowrate.is_empty());
        assert_eq!(form.draft().location, "Neg air exhaust");

        form.apply(SampleEdit::InitialFlowrate("2.0".into()));
        assert!(form.draft().initial_flowrate.is_empty());
    }

    #[test]
    fn test_hydrate_existing_sample() {
        let source = source();
        let mut draft = SampleDraft::new(None);
        draft.pump = Some("no-13mm".into());
        draft.filter_size = FilterSize::Mm25;
        draft.end_time = "15:00".into();
        draft.initial_flowrate = "2.0".into();
        draft.final_flowrate = "2.1".into();
        // Stale derived values get recomputed
        draft.average_flowrate = "9.9".into();
        draft.status = SampleStatus::Failed;

        let form = SampleForm::hydrate(&source, RulesConfig::default(), today(), draft);
        assert!(form.collection_edited());
        assert_eq!(form.flowrate_options(), vec![2.0, 3.0]);
        assert_eq!(form.draft().average_flowrate, "2.05");
        assert_eq!(form.draft().status, SampleStatus::Pending);
    }

    #[test]
    fn test_hydrate_field_blank_drops_flowrates() {
        let source = source();
        let mut draft = SampleDraft::new(None);
        draft.is_field_blank = true;
        draft.initial_flowrate = "2.0".into();
        draft.final_flowrate = "1.6".into();
        draft.average_flowrate = "1.8".into();
        draft.status = SampleStatus::Failed;

        let form = SampleForm::hydrate(&source, RulesConfig::default(), today(), draft);
        assert!(form.draft().initial_flowrate.is_empty());
        assert!(form.draft().final_flowrate.is_empty());
        assert!(form.draft().average_flowrate.is_empty());
        assert_eq!(form.draft().status, SampleStatus::Pending);

        let payload = SamplePayload::from_draft(form.draft(), form.config());
        assert_eq!(payload.initial_flowrate, None);
        assert_eq!(payload.average_flowrate, None);
        assert_eq!(payload.status, form.draft().status);
    }

    #[test]
    fn test_failed_lookup_leaves_empty_options() {
        let source = StubSource {
            fail: true,
            ..Default::default()
        };
        let mut form = SampleForm::new(&source, RulesConfig::default(), today(), None);
        form.apply(SampleEdit::Pump(Some("p1".into())));
        assert!(form.flowrate_catalog().is_empty());
        assert_eq!(form.draft().pump.as_deref(), Some("p1"));
    }
}
