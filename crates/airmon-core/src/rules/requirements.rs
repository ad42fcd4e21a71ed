//! Field requirements per sample category, and category transitions.
//!
//! | Category        | Required                                               |
//! |-----------------|--------------------------------------------------------|
//! | Standard        | sampler, number, pump, flowmeter, location, type,      |
//! |                 | start time, initial flow rate; end time and final flow |
//! |                 | rate once a collection field has been edited           |
//! | Field blank     | sampler, number (location and type are forced)         |
//! | Neg air exhaust | sampler, number, location                              |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::drift::parse_flowrate;
use super::duration::{
    check_sample_volume, elapsed_minutes, is_collection_before_setup, InsufficientSampleTime,
    TimeOfDay,
};
use crate::config::RulesConfig;
use crate::models::{SampleCategory, SampleDraft};

/// Form fields that can carry a validation error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SampleField {
    Sampler,
    SampleNumber,
    Location,
    #[serde(rename = "type")]
    SampleType,
    Pump,
    Flowmeter,
    StartTime,
    EndTime,
    InitialFlowrate,
    FinalFlowrate,
}

impl SampleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleField::Sampler => "sampler",
            SampleField::SampleNumber => "sampleNumber",
            SampleField::Location => "location",
            SampleField::SampleType => "type",
            SampleField::Pump => "pump",
            SampleField::Flowmeter => "flowmeter",
            SampleField::StartTime => "startTime",
            SampleField::EndTime => "endTime",
            SampleField::InitialFlowrate => "initialFlowrate",
            SampleField::FinalFlowrate => "finalFlowrate",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SampleField::Sampler => "Sampler",
            SampleField::SampleNumber => "Sample number",
            SampleField::Location => "Location",
            SampleField::SampleType => "Type",
            SampleField::Pump => "Pump",
            SampleField::Flowmeter => "Flowmeter",
            SampleField::StartTime => "Start time",
            SampleField::EndTime => "End time",
            SampleField::InitialFlowrate => "Initial flow rate",
            SampleField::FinalFlowrate => "Final flow rate",
        }
    }
}

impl fmt::Display for SampleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that must be filled in for a category.
pub fn required_fields(category: SampleCategory, collection_edited: bool) -> Vec<SampleField> {
    match category {
        SampleCategory::FieldBlank => vec![SampleField::Sampler, SampleField::SampleNumber],
        SampleCategory::NegAirExhaust => vec![
            SampleField::Sampler,
            SampleField::SampleNumber,
            SampleField::Location,
        ],
        SampleCategory::Standard => {
            let mut fields = vec![
                SampleField::Sampler,
                SampleField::SampleNumber,
                SampleField::Pump,
                SampleField::Flowmeter,
                SampleField::Location,
                SampleField::SampleType,
                SampleField::StartTime,
                SampleField::InitialFlowrate,
            ];
            if collection_edited {
                fields.push(SampleField::EndTime);
                fields.push(SampleField::FinalFlowrate);
            }
            fields
        }
    }
}

/// Outcome of validating a draft.
///
/// Errors block submission; warnings are shown but do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: BTreeMap<SampleField, String>,
    pub insufficient_sample_time: Option<InsufficientSampleTime>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field: SampleField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    fn add(&mut self, field: SampleField, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }
}

/// Validate a draft against its category's requirements and the timing rules.
pub fn validate_sample(
    draft: &SampleDraft,
    collection_edited: bool,
    config: &RulesConfig,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let category = draft.category();

    for field in required_fields(category, collection_edited) {
        if let Some(message) = check_required(draft, field) {
            report.add(field, message);
        }
    }

    if !category.has_timed_collection() {
        return report;
    }

    // Times that were typed but cannot be read are errors even when optional
    if !draft.end_time.trim().is_empty() && TimeOfDay::parse(&draft.end_time).is_none() {
        report.add(SampleField::EndTime, "End time must be HH:MM");
    }
    if !draft.final_flowrate.trim().is_empty() && parse_flowrate(&draft.final_flowrate).is_none()
    {
        report.add(
            SampleField::FinalFlowrate,
            "Final flow rate must be a positive number",
        );
    }

    if is_collection_before_setup(&draft.start_time, &draft.end_time, draft.next_day, category) {
        report.add(
            SampleField::EndTime,
            "Collection time is before setup time; tick next day if collected tomorrow",
        );
    }

    report.insufficient_sample_time = check_sample_volume(
        elapsed_minutes(&draft.start_time, &draft.end_time, draft.next_day),
        parse_flowrate(&draft.final_flowrate),
        &draft.filter_size,
        config,
    );

    report
}

fn check_required(draft: &SampleDraft, field: SampleField) -> Option<String> {
    let missing = || Some(format!("{} is required", field.label()));
    match field {
        SampleField::Sampler => blank(&draft.sampler).then(missing)?,
        SampleField::SampleNumber => blank(&draft.sample_number).then(missing)?,
        SampleField::Location => blank(&draft.location).then(missing)?,
        SampleField::SampleType => blank(&draft.sample_type).then(missing)?,
        SampleField::Pump => blank_opt(&draft.pump).then(missing)?,
        SampleField::Flowmeter => blank_opt(&draft.flowmeter).then(missing)?,
        SampleField::StartTime | SampleField::EndTime => {
            let value = if field == SampleField::StartTime {
                &draft.start_time
            } else {
                &draft.end_time
            };
            if blank(value) {
                missing()
            } else if TimeOfDay::parse(value).is_none() {
                Some(format!("{} must be HH:MM", field.label()))
            } else {
                None
            }
        }
        SampleField::InitialFlowrate | SampleField::FinalFlowrate => {
            let value = if field == SampleField::InitialFlowrate {
                &draft.initial_flowrate
            } else {
                &draft.final_flowrate
            };
            if blank(value) {
                missing()
            } else if parse_flowrate(value).is_none() {
                Some(format!("{} must be a positive number", field.label()))
            } else {
                None
            }
        }
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn blank_opt(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, blank)
}

/// Turn the field-blank flag on or off.
///
/// Turning it on clears neg-air-exhaust, clears flow rates and forces the
/// field-blank location and type. Turning it off releases the forced values.
pub fn set_field_blank(draft: &mut SampleDraft, enabled: bool, config: &RulesConfig) {
    if enabled {
        draft.is_neg_air_exhaust = false;
        draft.is_field_blank = true;
        draft.clear_flowrates();
    } else if draft.is_field_blank {
        draft.is_field_blank = false;
        if draft.location == config.field_blank_location {
            draft.location.clear();
        }
        if draft.sample_type == config.field_blank_type {
            draft.sample_type.clear();
        }
    }
    enforce_category_defaults(draft, config);
}

/// Turn the neg-air-exhaust flag on or off.
///
/// Turning it on clears field blank and flow rates and pre-fills the
/// location if it is empty.
pub fn set_neg_air_exhaust(draft: &mut SampleDraft, enabled: bool, config: &RulesConfig) {
    if enabled {
        if draft.is_field_blank {
            set_field_blank(draft, false, config);
        }
        draft.is_neg_air_exhaust = true;
        draft.clear_flowrates();
    } else {
        draft.is_neg_air_exhaust = false;
    }
    enforce_category_defaults(draft, config);
}

/// Re-apply the values a category forces or defaults.
pub fn enforce_category_defaults(draft: &mut SampleDraft, config: &RulesConfig) {
    match draft.category() {
        SampleCategory::FieldBlank => {
            draft.is_neg_air_exhaust = false;
            draft.location = config.field_blank_location.clone();
            draft.sample_type = config.field_blank_type.clone();
        }
        SampleCategory::NegAirExhaust => {
            if blank(&draft.location) {
                draft.location = config.neg_air_exhaust_location.clone();
            }
        }
        SampleCategory::Standard => {}
    }
}
