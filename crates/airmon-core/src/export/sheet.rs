//! Shift sample sheet export.

use serde::{Deserialize, Serialize};

use super::SamplePayload;
use crate::config::RulesConfig;
use crate::models::{SampleDraft, SampleStatus};
use crate::rules::format_average;

/// Every sample of one air-monitoring shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSampleSheet {
    pub shift_id: String,
    /// Export timestamp
    pub exported_at: String,
    pub samples: Vec<SamplePayload>,
    /// Samples whose flow rate drifted out of tolerance
    pub failed_count: usize,
}

impl ShiftSampleSheet {
    /// Build a sheet from the stored drafts of a shift.
    pub fn from_samples(shift_id: &str, drafts: &[SampleDraft], config: &RulesConfig) -> Self {
        let samples: Vec<SamplePayload> = drafts
            .iter()
            .map(|d| SamplePayload::from_draft(d, config))
            .collect();
        let failed_count = samples
            .iter()
            .filter(|s| s.status == SampleStatus::Failed)
            .count();

        Self {
            shift_id: shift_id.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            samples,
            failed_count,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("shift_id,sample_number,sampler,location,type,field_blank,neg_air_exhaust,pump,flowmeter,cowl_number,filter_size,start_time,end_time,next_day,minutes,initial_flowrate,final_flowrate,average_flowrate,status,notes\n");

        for s in &self.samples {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                escape_csv(&self.shift_id),
                escape_csv(&s.sample_number),
                escape_csv(&s.sampler),
                escape_csv(&s.location),
                escape_csv(&s.sample_type),
                s.is_field_blank,
                s.is_neg_air_exhaust,
                escape_csv(s.pump.as_deref().unwrap_or("")),
                escape_csv(s.flowmeter.as_deref().unwrap_or("")),
                escape_csv(&s.cowl_number),
                s.filter_size.as_str(),
                s.start_time.as_deref().unwrap_or(""),
                s.end_time.as_deref().unwrap_or(""),
                s.next_day,
                s.sample_minutes.map(|m| m.to_string()).unwrap_or_default(),
                format_rate(s.initial_flowrate),
                format_rate(s.final_flowrate),
                s.average_flowrate.map(format_average).unwrap_or_default(),
                s.status,
                escape_csv(&s.notes),
            ));
        }

        csv
    }
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| r.to_string()).unwrap_or_default()
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterSize;

    fn make_sample(number: &str, final_flowrate: &str) -> SampleDraft {
        let mut draft = SampleDraft::new(Some("shift-1".into()));
        draft.sampler = "J. Doe".into();
        draft.sample_number = number.into();
        draft.location = "Level 2, east stair".into();
        draft.sample_type = "Background".into();
        draft.pump = Some("p1".into());
        draft.flowmeter = Some("f1".into());
        draft.filter_size = FilterSize::Mm25;
        draft.start_time = "07:00".into();
        draft.end_time = "11:00".into();
        draft.initial_flowrate = "2.0".into();
        draft.final_flowrate = final_flowrate.into();
        draft
    }

    fn sheet() -> ShiftSampleSheet {
        ShiftSampleSheet::from_samples(
            "shift-1",
            &[make_sample("AM-001", "1.9"), make_sample("AM-002", "1.6")],
            &RulesConfig::default(),
        )
    }

    #[test]
    fn test_sheet_counts_failed() {
        let sheet = sheet();
        assert_eq!(sheet.samples.len(), 2);
        assert_eq!(sheet.failed_count, 1);
    }

    #[test]
    fn test_sheet_csv() {
        let csv = sheet().to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 samples
        assert!(lines[0].starts_with("shift_id,sample_number"));
        assert!(lines[1].contains("AM-001"));
        assert!(lines[1].contains("\"Level 2, east stair\""));
        assert!(lines[1].contains(",240,2,1.9,1.95,pending,"));
        assert!(lines[2].contains(",1.8,failed,"));
    }

    #[test]
    fn test_sheet_json() {
        let json = sheet().to_json().unwrap();
        assert!(json.contains("\"failedCount\": 1"));
        assert!(json.contains("AM-002"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
