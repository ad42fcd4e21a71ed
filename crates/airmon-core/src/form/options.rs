//! Equipment option lists for pump and flowmeter pickers.

use chrono::NaiveDate;

use super::cache::{fetch_history, CalibrationSource};
use crate::config::RulesConfig;
use crate::models::{Equipment, EquipmentType};
use crate::rules::EquipmentEligibility;

/// Every piece of equipment of a type with its derived status, sorted by
/// reference. A failed listing is logged and yields an empty list.
pub fn equipment_statuses(
    source: &dyn CalibrationSource,
    equipment_type: &EquipmentType,
    today: NaiveDate,
    config: &RulesConfig,
) -> Vec<EquipmentEligibility> {
    let equipment = match source.list_equipment(Some(equipment_type)) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(equipment_type = %equipment_type, error = %e, "equipment listing failed");
            return Vec::new();
        }
    };

    let mut entries: Vec<EquipmentEligibility> = equipment
        .into_iter()
        .map(|item| {
            let history = fetch_history(source, &item);
            EquipmentEligibility::evaluate(item, &history, today, config)
        })
        .collect();
    entries.sort_by(|a, b| {
        a.equipment
            .equipment_reference
            .cmp(&b.equipment.equipment_reference)
    });
    entries
}

/// Equipment of a type that may be picked for a sample today.
pub fn active_equipment(
    source: &dyn CalibrationSource,
    equipment_type: &EquipmentType,
    today: NaiveDate,
    config: &RulesConfig,
) -> Vec<Equipment> {
    equipment_statuses(source, equipment_type, today, config)
        .into_iter()
        .filter(|entry| entry.status.is_usable())
        .map(|entry| entry.equipment)
        .collect()
}
