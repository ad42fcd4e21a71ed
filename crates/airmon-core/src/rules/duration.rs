//! Sample duration and collected-volume checks.

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::models::{FilterSize, SampleCategory};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// A wall-clock time, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Parse "HH:MM" (or "H:MM"). Seconds, if present, are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hours: u16 = parts.next()?.trim().parse().ok()?;
        let minutes: u16 = parts.next()?.trim().parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }
        Some(TimeOfDay(hours * 60 + minutes))
    }

    pub fn total_minutes(&self) -> i64 {
        i64::from(self.0)
    }
}

/// Minutes between setup and collection.
///
/// Adds a day when the end is before the start, or when the sample was
/// flagged as collected the next day. `None` if either time is missing.
pub fn elapsed_minutes(start_time: &str, end_time: &str, next_day: bool) -> Option<i64> {
    let start = TimeOfDay::parse(start_time)?;
    let end = TimeOfDay::parse(end_time)?;
    let mut minutes = end.total_minutes() - start.total_minutes();
    if minutes < 0 || next_day {
        minutes += MINUTES_PER_DAY;
    }
    Some(minutes)
}

/// Sampled volume as minutes × L/min.
pub fn collected_volume(minutes: i64, final_flowrate: f64) -> f64 {
    minutes as f64 * final_flowrate
}

/// Minimum minutes × L/min for a filter size.
pub fn minimum_volume(filter_size: &FilterSize, config: &RulesConfig) -> f64 {
    if filter_size.is_13mm() {
        config.min_volume_13mm
    } else {
        config.min_volume_25mm
    }
}

/// Collected volume fell short of what the filter size needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientSampleTime {
    pub minutes: i64,
    pub volume: f64,
    pub minimum_volume: f64,
}

/// Check collected volume against the filter-size minimum.
///
/// Returns `None` when the volume is sufficient or cannot be computed yet.
pub fn check_sample_volume(
    minutes: Option<i64>,
    final_flowrate: Option<f64>,
    filter_size: &FilterSize,
    config: &RulesConfig,
) -> Option<InsufficientSampleTime> {
    let minutes = minutes?;
    let flowrate = final_flowrate?;
    let volume = collected_volume(minutes, flowrate);
    let minimum = minimum_volume(filter_size, config);
    (volume < minimum).then_some(InsufficientSampleTime {
        minutes,
        volume,
        minimum_volume: minimum,
    })
}

/// Collection time is before setup on the same day.
///
/// Never flagged for samples without a timed collection phase.
pub fn is_collection_before_setup(
    start_time: &str,
    end_time: &str,
    next_day: bool,
    category: SampleCategory,
) -> bool {
    if !category.has_timed_collection() || next_day {
        return false;
    }
    match (TimeOfDay::parse(start_time), TimeOfDay::parse(end_time)) {
        (Some(start), Some(end)) => end < start,
        _ => false,
    }
}
