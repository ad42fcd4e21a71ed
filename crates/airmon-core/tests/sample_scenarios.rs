//! Scenario tests for sample validity and equipment eligibility.
//!
//! Each case walks a realistic form session end to end.

use airmon_core::config::RulesConfig;
use airmon_core::db::Database;
use airmon_core::form::{active_equipment, SampleEdit, SampleForm, SubmitError};
use airmon_core::models::{
    Equipment, EquipmentType, FilterSize, FlowmeterCalibration, PumpCalibration, SampleStatus,
};
use airmon_core::rules::{
    build_flowrate_catalog, compatible_flowrates, elapsed_minutes, resolve_flowrates, SampleField,
};
use chrono::{Duration, NaiveDate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

/// A store with two usable pumps, one that only runs 1.5 L/min, and a flowmeter.
fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();

    for (id, reference) in [("p1", "AP-001"), ("p2", "AP-002"), ("p3", "AP-003")] {
        db.upsert_equipment(&Equipment::new(id.into(), EquipmentType::AirPump, reference.into()))
            .unwrap();
    }
    db.upsert_equipment(&Equipment::new(
        "f1".into(),
        EquipmentType::SiteFlowmeter,
        "FM-001".into(),
    ))
    .unwrap();

    let fresh = PumpCalibration::new(today(), today() + Duration::days(300));
    db.insert_pump_calibration("p1", &fresh.clone().with_result(1500.0, true))
        .unwrap();
    db.insert_pump_calibration(
        "p2",
        &fresh
            .clone()
            .with_result(2000.0, true)
            .with_result(3000.0, true)
            .with_result(4000.0, false),
    )
    .unwrap();
    // p3 failed its latest calibration
    db.insert_pump_calibration("p3", &fresh.with_result(2000.0, false))
        .unwrap();
    db.insert_flowmeter_calibration(
        "f1",
        &FlowmeterCalibration::new(today() - Duration::days(20), today() + Duration::days(160)),
    )
    .unwrap();
    db
}

#[test]
fn test_eligible_pump_flowrate_options() {
    let cal = PumpCalibration::new(today(), today() + Duration::days(300)).with_result(1500.0, true);
    let config = RulesConfig::default();

    let catalog = build_flowrate_catalog(&[cal], today());
    assert_eq!(catalog, vec![1.5]);
    assert_eq!(
        compatible_flowrates(&catalog, &FilterSize::Mm13, &config),
        vec![1.5]
    );
    assert!(compatible_flowrates(&catalog, &FilterSize::Mm25, &config).is_empty());
}

#[test]
fn test_drift_fail_and_boundary() {
    let config = RulesConfig::default();
    assert_eq!(
        resolve_flowrates(Some(2.0), Some(1.6), &config).status,
        SampleStatus::Failed
    );
    assert_eq!(
        resolve_flowrates(Some(2.0), Some(1.8), &config).status,
        SampleStatus::Pending
    );
}

#[test]
fn test_insufficient_volume_flagged() {
    let db = seeded_db();
    let mut form = SampleForm::new(&db, RulesConfig::default(), today(), Some("shift-1".into()));
    form.apply(SampleEdit::Sampler("J. Doe".into()));
    form.apply(SampleEdit::SampleNumber("AM-001".into()));
    form.apply(SampleEdit::Location("Basement".into()));
    form.apply(SampleEdit::SampleType("Background".into()));
    form.apply(SampleEdit::Pump(Some("p2".into())));
    form.apply(SampleEdit::Flowmeter(Some("f1".into())));
    form.apply(SampleEdit::FilterSize(FilterSize::Mm25));
    form.apply(SampleEdit::StartTime("08:00".into()));
    form.apply(SampleEdit::InitialFlowrate("3.0".into()));
    form.apply(SampleEdit::EndTime("09:40".into()));
    form.apply(SampleEdit::FinalFlowrate("3.0".into()));

    assert_eq!(form.elapsed_minutes(), Some(100));
    let report = form.validate();
    let warning = report.insufficient_sample_time.expect("volume should be flagged");
    assert_eq!(warning.volume, 300.0);
    assert_eq!(warning.minimum_volume, 360.0);
    // A warning does not block submission
    assert!(form.submit().is_ok());
}

#[test]
fn test_next_day_rollover() {
    assert_eq!(elapsed_minutes("22:00", "02:00", true), Some(240));
    assert_eq!(elapsed_minutes("08:00", "12:00", true), Some(28 * 60));
    assert_eq!(elapsed_minutes("22:00", "", true), None);
}

#[test]
fn test_active_equipment_from_store() {
    let db = seeded_db();
    let config = RulesConfig::default();

    let pumps = active_equipment(&db, &EquipmentType::AirPump, today(), &config);
    let ids: Vec<&str> = pumps.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);

    let meters = active_equipment(&db, &EquipmentType::SiteFlowmeter, today(), &config);
    assert_eq!(meters.len(), 1);

    // A year and a bit later every calibration is stale
    let later = today() + Duration::days(400);
    assert!(active_equipment(&db, &EquipmentType::AirPump, later, &config).is_empty());
}

#[test]
fn test_thirteen_mm_pump_switch() {
    let db = seeded_db();
    let mut form = SampleForm::new(&db, RulesConfig::default(), today(), None);

    form.apply(SampleEdit::Pump(Some("p1".into())));
    form.apply(SampleEdit::FilterSize(FilterSize::Mm13));
    assert_eq!(form.flowrate_options(), vec![1.5]);
    form.apply(SampleEdit::InitialFlowrate("1.5".into()));

    // p2 cannot run 1.5 L/min, so the 13 mm filter is dropped
    form.apply(SampleEdit::Pump(Some("p2".into())));
    assert_eq!(form.draft().filter_size, FilterSize::Mm25);
    assert!(form.draft().initial_flowrate.is_empty());
    assert_eq!(form.flowrate_options(), vec![2.0, 3.0]);
}

#[test]
fn test_full_form_session_persists() {
    let db = seeded_db();
    let config = RulesConfig::default();

    let mut form = SampleForm::new(&db, config.clone(), today(), Some("shift-9".into()));
    form.apply(SampleEdit::Sampler("A. Smith".into()));
    form.apply(SampleEdit::SampleNumber("AM-101".into()));
    form.apply(SampleEdit::Location("Plant room".into()));
    form.apply(SampleEdit::SampleType("Exposure".into()));
    form.apply(SampleEdit::Pump(Some("p2".into())));
    form.apply(SampleEdit::Flowmeter(Some("f1".into())));
    form.apply(SampleEdit::CowlNumber("c 15".into()));
    form.apply(SampleEdit::StartTime("07:30".into()));
    form.apply(SampleEdit::InitialFlowrate("2.0".into()));

    // Collection latch: end fields now required
    form.apply(SampleEdit::EndTime("06:30".into()));
    let report = form.validate();
    assert!(report.error_for(SampleField::FinalFlowrate).is_some());
    assert!(report
        .error_for(SampleField::EndTime)
        .is_some_and(|m| m.contains("before setup")));
    assert!(matches!(form.submit(), Err(SubmitError::Invalid(_))));

    form.apply(SampleEdit::NextDay(true));
    form.apply(SampleEdit::FinalFlowrate("1.6".into()));
    let payload = form.submit().unwrap();
    assert_eq!(payload.status, SampleStatus::Failed);
    assert_eq!(payload.cowl_number, "C15");
    assert_eq!(payload.sample_minutes, Some(23 * 60));

    let draft = form.into_draft();
    db.save_sample(&draft).unwrap();

    let stored = db.get_sample(&draft.sample_id).unwrap().unwrap();
    assert_eq!(stored.average_flowrate, "1.8");
    assert_eq!(stored.status, SampleStatus::Failed);

    // Reopening the stored sample keeps the collection fields required
    let reopened = SampleForm::hydrate(&db, config, today(), stored);
    assert!(reopened.collection_edited());
    assert!(reopened.validate().is_valid());
}

#[test]
fn test_field_blank_session() {
    let db = seeded_db();
    let mut form = SampleForm::new(&db, RulesConfig::default(), today(), None);
    form.apply(SampleEdit::Sampler("J. Doe".into()));
    form.apply(SampleEdit::SampleNumber("FB-01".into()));
    form.apply(SampleEdit::FieldBlank(true));

    assert_eq!(form.draft().location, "Field blank");
    assert_eq!(form.draft().sample_type, "-");

    // Forced values cannot be edited away
    form.apply(SampleEdit::Location("Somewhere".into()));
    assert_eq!(form.draft().location, "Field blank");

    let payload = form.submit().unwrap();
    assert!(payload.is_field_blank);
    assert_eq!(payload.average_flowrate, None);
}
