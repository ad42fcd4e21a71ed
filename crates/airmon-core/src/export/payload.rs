//! Sample submission payload for the sample API.

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::models::{format_cowl_number, FilterSize, SampleCategory, SampleDraft, SampleStatus};
use crate::rules::{elapsed_minutes, parse_flowrate, resolve_flowrates};

/// A sample as sent to the sample API.
///
/// Flow rates are numbers here; the derived average and status are
/// recomputed from the flow rates rather than copied from the draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamplePayload {
    #[serde(rename = "_id")]
    pub sample_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
    pub sampler: String,
    pub sample_number: String,
    pub is_field_blank: bool,
    pub is_neg_air_exhaust: bool,
    pub location: String,
    #[serde(rename = "type")]
    pub sample_type: String,
    pub pump: Option<String>,
    pub flowmeter: Option<String>,
    pub cowl_number: String,
    pub filter_size: FilterSize,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub next_day: bool,
    /// L/min
    pub initial_flowrate: Option<f64>,
    /// L/min
    pub final_flowrate: Option<f64>,
    /// L/min, rounded as displayed
    pub average_flowrate: Option<f64>,
    /// Minutes between setup and collection
    pub sample_minutes: Option<i64>,
    pub status: SampleStatus,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl SamplePayload {
    /// Build the payload from a draft.
    pub fn from_draft(draft: &SampleDraft, config: &RulesConfig) -> Self {
        let timed = draft.category().has_timed_collection();
        let (initial, final_) = if draft.category() == SampleCategory::Standard {
            (
                parse_flowrate(&draft.initial_flowrate),
                parse_flowrate(&draft.final_flowrate),
            )
        } else {
            (None, None)
        };
        let resolution = resolve_flowrates(initial, final_, config);

        Self {
            sample_id: draft.sample_id.clone(),
            shift_id: draft.shift_id.clone(),
            sampler: draft.sampler.trim().to_string(),
            sample_number: draft.sample_number.trim().to_string(),
            is_field_blank: draft.is_field_blank,
            is_neg_air_exhaust: draft.is_neg_air_exhaust && !draft.is_field_blank,
            location: draft.location.trim().to_string(),
            sample_type: draft.sample_type.trim().to_string(),
            pump: draft.pump.clone(),
            flowmeter: draft.flowmeter.clone(),
            cowl_number: format_cowl_number(&draft.cowl_number),
            filter_size: draft.filter_size.clone(),
            start_time: non_empty(&draft.start_time),
            end_time: non_empty(&draft.end_time),
            next_day: draft.next_day,
            initial_flowrate: initial,
            final_flowrate: final_,
            average_flowrate: resolution.average_display.parse().ok(),
            sample_minutes: if timed {
                elapsed_minutes(&draft.start_time, &draft.end_time, draft.next_day)
            } else {
                None
            },
            status: resolution.status,
            notes: draft.notes.trim().to_string(),
            created_at: draft.created_at.clone(),
            updated_at: draft.updated_at.clone(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SampleDraft {
        let mut draft = SampleDraft::new(Some("shift-1".into()));
        draft.sampler = " J. Doe ".into();
        draft.sample_number = "AM-001".into();
        draft.location = "Basement".into();
        draft.sample_type = "Background".into();
        draft.pump = Some("p1".into());
        draft.flowmeter = Some("f1".into());
        draft.cowl_number = "7".into();
        draft.filter_size = FilterSize::Mm25;
        draft.start_time = "07:00".into();
        draft.end_time = "11:00".into();
        draft.initial_flowrate = "2.0".into();
        draft.final_flowrate = "1.6".into();
        draft
    }

    #[test]
    fn test_from_draft_recomputes_derived_fields() {
        let mut d = draft();
        // Stale values on the draft are ignored
        d.average_flowrate = "5".into();
        d.status = SampleStatus::Pending;

        let payload = SamplePayload::from_draft(&d, &RulesConfig::default());
        assert_eq!(payload.sampler, "J. Doe");
        assert_eq!(payload.cowl_number, "C7");
        assert_eq!(payload.initial_flowrate, Some(2.0));
        assert_eq!(payload.average_flowrate, Some(1.8));
        assert_eq!(payload.status, SampleStatus::Failed);
        assert_eq!(payload.sample_minutes, Some(240));
        assert_eq!(payload.end_time.as_deref(), Some("11:00"));
    }

    #[test]
    fn test_field_blank_payload_has_no_flow_data() {
        let mut d = draft();
        d.is_field_blank = true;
        d.is_neg_air_exhaust = true;

        let payload = SamplePayload::from_draft(&d, &RulesConfig::default());
        assert!(!payload.is_neg_air_exhaust);
        assert_eq!(payload.initial_flowrate, None);
        assert_eq!(payload.average_flowrate, None);
        assert_eq!(payload.sample_minutes, None);
        assert_eq!(payload.status, SampleStatus::Pending);
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = SamplePayload::from_draft(&draft(), &RulesConfig::default());
        let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();

        assert_eq!(value["_id"], payload.sample_id.as_str());
        assert_eq!(value["type"], "Background");
        assert_eq!(value["filterSize"], "25mm");
        assert_eq!(value["averageFlowrate"], 1.8);
        assert_eq!(value["status"], "failed");
        assert_eq!(value["shiftId"], "shift-1");
    }
}
