//! Air-monitoring sample models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Derived pass/fail status of a sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    /// Flow rates are within tolerance (or not yet entered); awaiting analysis
    #[default]
    Pending,
    /// Flow rate drifted beyond tolerance
    Failed,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "pending",
            SampleStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter cassette size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum FilterSize {
    /// Nothing selected yet
    #[default]
    Unset,
    /// 13 mm filter, only usable at 1.5 L/min
    Mm13,
    /// 25 mm filter
    Mm25,
    /// Any other value; treated like 25 mm
    Other(String),
}

impl FilterSize {
    pub fn as_str(&self) -> &str {
        match self {
            FilterSize::Unset => "",
            FilterSize::Mm13 => "13mm",
            FilterSize::Mm25 => "25mm",
            FilterSize::Other(s) => s,
        }
    }

    pub fn is_13mm(&self) -> bool {
        matches!(self, FilterSize::Mm13)
    }
}

impl From<String> for FilterSize {
    fn from(s: String) -> Self {
        match s.trim() {
            "" => FilterSize::Unset,
            "13mm" => FilterSize::Mm13,
            "25mm" => FilterSize::Mm25,
            _ => FilterSize::Other(s),
        }
    }
}

impl From<&str> for FilterSize {
    fn from(s: &str) -> Self {
        FilterSize::from(s.to_string())
    }
}

impl From<FilterSize> for String {
    fn from(f: FilterSize) -> Self {
        f.as_str().to_string()
    }
}

/// Mutually exclusive sample categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SampleCategory {
    /// Personal or area sample with a timed collection phase
    Standard,
    /// Control sample with no airflow through the filter
    FieldBlank,
    /// Sample taken from a negative air unit's exhaust
    NegAirExhaust,
}

impl SampleCategory {
    /// Field blanks and exhaust samples have no timed collection phase.
    pub fn has_timed_collection(&self) -> bool {
        matches!(self, SampleCategory::Standard)
    }
}

/// A sample being authored in a form (mutable, pre-submission).
///
/// Times and flow rates hold what the user typed; the rules parse them and
/// treat anything unparseable as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SampleDraft {
    /// Local sample ID
    #[serde(rename = "_id")]
    pub sample_id: String,
    /// Air-monitoring shift this sample belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
    /// Person who set up the sample
    #[serde(default)]
    pub sampler: String,
    #[serde(default)]
    pub sample_number: String,
    #[serde(default)]
    pub is_field_blank: bool,
    #[serde(default)]
    pub is_neg_air_exhaust: bool,
    #[serde(default)]
    pub location: String,
    /// Sample type (e.g., "Background", "Clearance", "Exposure")
    #[serde(rename = "type", default)]
    pub sample_type: String,
    /// Pump equipment ID
    #[serde(default)]
    pub pump: Option<String>,
    /// Flowmeter equipment ID
    #[serde(default)]
    pub flowmeter: Option<String>,
    /// Cowl number, stored with a "C" prefix
    #[serde(default)]
    pub cowl_number: String,
    #[serde(default)]
    pub filter_size: FilterSize,
    /// "HH:MM"
    #[serde(default)]
    pub start_time: String,
    /// "HH:MM"
    #[serde(default)]
    pub end_time: String,
    /// Collection finished on the day after setup
    #[serde(default)]
    pub next_day: bool,
    /// L/min as typed
    #[serde(default)]
    pub initial_flowrate: String,
    /// L/min as typed
    #[serde(default)]
    pub final_flowrate: String,
    /// Derived from initial/final; never edited directly
    #[serde(default)]
    pub average_flowrate: String,
    #[serde(default)]
    pub notes: String,
    /// Derived from initial/final; never edited directly
    #[serde(default)]
    pub status: SampleStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl SampleDraft {
    /// Create an empty draft.
    pub fn new(shift_id: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            sample_id: uuid::Uuid::new_v4().to_string(),
            shift_id,
            sampler: String::new(),
            sample_number: String::new(),
            is_field_blank: false,
            is_neg_air_exhaust: false,
            location: String::new(),
            sample_type: String::new(),
            pump: None,
            flowmeter: None,
            cowl_number: String::new(),
            filter_size: FilterSize::Unset,
            start_time: String::new(),
            end_time: String::new(),
            next_day: false,
            initial_flowrate: String::new(),
            final_flowrate: String::new(),
            average_flowrate: String::new(),
            notes: String::new(),
            status: SampleStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Which category the flags select. Field blank wins if both are set.
    pub fn category(&self) -> SampleCategory {
        if self.is_field_blank {
            SampleCategory::FieldBlank
        } else if self.is_neg_air_exhaust {
            SampleCategory::NegAirExhaust
        } else {
            SampleCategory::Standard
        }
    }

    /// Clear every flow-rate field and reset the derived status.
    pub fn clear_flowrates(&mut self) {
        self.initial_flowrate.clear();
        self.final_flowrate.clear();
        self.average_flowrate.clear();
        self.status = SampleStatus::Pending;
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Normalize a cowl number to a single upper-case "C" prefix.
pub fn format_cowl_number(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('C')
        .or_else(|| trimmed.strip_prefix('c'))
        .unwrap_or(trimmed)
        .trim();
    if digits.is_empty() {
        String::new()
    } else {
        format!("C{}", digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft() {
        let draft = SampleDraft::new(Some("shift-1".into()));
        assert_eq!(draft.shift_id.as_deref(), Some("shift-1"));
        assert_eq!(draft.status, SampleStatus::Pending);
        assert_eq!(draft.category(), SampleCategory::Standard);
        assert_eq!(draft.sample_id.len(), 36);
    }

    #[test]
    fn test_category_from_flags() {
        let mut draft = SampleDraft::new(None);
        draft.is_neg_air_exhaust = true;
        assert_eq!(draft.category(), SampleCategory::NegAirExhaust);
        assert!(!draft.category().has_timed_collection());

        draft.is_neg_air_exhaust = false;
        draft.is_field_blank = true;
        assert_eq!(draft.category(), SampleCategory::FieldBlank);
    }

    #[test]
    fn test_filter_size_strings() {
        assert_eq!(FilterSize::from(""), FilterSize::Unset);
        assert_eq!(FilterSize::from("13mm"), FilterSize::Mm13);
        assert_eq!(FilterSize::from("25mm"), FilterSize::Mm25);
        assert_eq!(FilterSize::from("37mm"), FilterSize::Other("37mm".into()));
        assert_eq!(String::from(FilterSize::Mm13), "13mm");
    }

    #[test]
    fn test_draft_json_uses_api_names() {
        let mut draft = SampleDraft::new(None);
        draft.sample_type = "Clearance".into();
        draft.filter_size = FilterSize::Mm25;
        draft.status = SampleStatus::Failed;

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "Clearance");
        assert_eq!(json["filterSize"], "25mm");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["isFieldBlank"], false);
        assert!(json.get("_id").is_some());
    }

    #[test]
    fn test_clear_flowrates() {
        let mut draft = SampleDraft::new(None);
        draft.initial_flowrate = "2.0".into();
        draft.final_flowrate = "1.6".into();
        draft.average_flowrate = "1.8".into();
        draft.status = SampleStatus::Failed;

        draft.clear_flowrates();
        assert!(draft.initial_flowrate.is_empty());
        assert!(draft.final_flowrate.is_empty());
        assert!(draft.average_flowrate.is_empty());
        assert_eq!(draft.status, SampleStatus::Pending);
    }

    #[test]
    fn test_format_cowl_number() {
        assert_eq!(format_cowl_number("12"), "C12");
        assert_eq!(format_cowl_number("C12"), "C12");
        assert_eq!(format_cowl_number("c12"), "C12");
        assert_eq!(format_cowl_number(" 7 "), "C7");
        assert_eq!(format_cowl_number(""), "");
        assert_eq!(format_cowl_number("C"), "");
    }
}
