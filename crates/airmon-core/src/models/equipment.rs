//! Equipment registry models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Manual status value that takes equipment out of use regardless of calibration.
pub const OUT_OF_SERVICE: &str = "out-of-service";

/// Kind of equipment, as named by the equipment registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum EquipmentType {
    /// Personal or static sampling pump
    AirPump,
    /// Flowmeter used on site to set and check pump flow rates
    SiteFlowmeter,
    /// Anything else in the registry (the rules treat it like a pump)
    Other(String),
}

impl EquipmentType {
    pub fn as_str(&self) -> &str {
        match self {
            EquipmentType::AirPump => "Air pump",
            EquipmentType::SiteFlowmeter => "Site flowmeter",
            EquipmentType::Other(s) => s,
        }
    }
}

impl From<String> for EquipmentType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Air pump" => EquipmentType::AirPump,
            "Site flowmeter" => EquipmentType::SiteFlowmeter,
            _ => EquipmentType::Other(s),
        }
    }
}

impl From<EquipmentType> for String {
    fn from(t: EquipmentType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of equipment from the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    /// Registry ID
    #[serde(rename = "_id")]
    pub id: String,
    /// Equipment type
    pub equipment_type: EquipmentType,
    /// Human reference shown in pickers (e.g., "AP-014")
    pub equipment_reference: String,
    /// Manually set status; only "out-of-service" has meaning to the rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Brand/model description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_model: Option<String>,
}

impl Equipment {
    /// Create a new equipment record with required fields.
    pub fn new(id: String, equipment_type: EquipmentType, equipment_reference: String) -> Self {
        Self {
            id,
            equipment_type,
            equipment_reference,
            status: None,
            brand_model: None,
        }
    }

    /// Check if someone has manually marked this equipment out of service.
    pub fn is_marked_out_of_service(&self) -> bool {
        self.status.as_deref() == Some(OUT_OF_SERVICE)
    }

    pub fn is_flowmeter(&self) -> bool {
        self.equipment_type == EquipmentType::SiteFlowmeter
    }
}

/// Status derived from the calibration history on every read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DerivedEquipmentStatus {
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "Calibration Overdue")]
    CalibrationOverdue,
    #[serde(rename = "Out-of-Service")]
    OutOfService,
}

impl DerivedEquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedEquipmentStatus::Active => "Active",
            DerivedEquipmentStatus::CalibrationOverdue => "Calibration Overdue",
            DerivedEquipmentStatus::OutOfService => "Out-of-Service",
        }
    }

    /// Only active equipment may be picked for a sample.
    pub fn is_usable(&self) -> bool {
        matches!(self, DerivedEquipmentStatus::Active)
    }
}

impl fmt::Display for DerivedEquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_from_api_json() {
        let json = r#"{
            "_id": "64f0c2",
            "equipmentType": "Air pump",
            "equipmentReference": "AP-014",
            "status": "out-of-service"
        }"#;
        let equipment: Equipment = serde_json::from_str(json).unwrap();

        assert_eq!(equipment.id, "64f0c2");
        assert_eq!(equipment.equipment_type, EquipmentType::AirPump);
        assert!(equipment.is_marked_out_of_service());
        assert!(!equipment.is_flowmeter());
    }

    #[test]
    fn test_unknown_equipment_type_preserved() {
        let t: EquipmentType = serde_json::from_str(r#""Smoke tube""#).unwrap();
        assert_eq!(t, EquipmentType::Other("Smoke tube".into()));
        assert_eq!(serde_json::to_string(&t).unwrap(), r#""Smoke tube""#);
    }

    #[test]
    fn test_manual_status_is_exact_match() {
        let mut equipment =
            Equipment::new("1".into(), EquipmentType::SiteFlowmeter, "FM-1".into());
        assert!(!equipment.is_marked_out_of_service());

        equipment.status = Some("Out-of-Service".into());
        assert!(!equipment.is_marked_out_of_service());

        equipment.status = Some(OUT_OF_SERVICE.into());
        assert!(equipment.is_marked_out_of_service());
    }

    #[test]
    fn test_derived_status_serializes_display_names() {
        let json = serde_json::to_string(&DerivedEquipmentStatus::CalibrationOverdue).unwrap();
        assert_eq!(json, r#""Calibration Overdue""#);
        assert_eq!(DerivedEquipmentStatus::OutOfService.to_string(), "Out-of-Service");
        assert!(DerivedEquipmentStatus::Active.is_usable());
        assert!(!DerivedEquipmentStatus::CalibrationOverdue.is_usable());
    }
}
