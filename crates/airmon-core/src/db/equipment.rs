//! Equipment registry operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{Equipment, EquipmentType};

impl Database {
    /// Insert or update a piece of equipment.
    pub fn upsert_equipment(&self, equipment: &Equipment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO equipment (
                id, equipment_type, equipment_reference, status, brand_model, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                equipment_type = excluded.equipment_type,
                equipment_reference = excluded.equipment_reference,
                status = excluded.status,
                brand_model = excluded.brand_model,
                updated_at = datetime('now')
            "#,
            params![
                equipment.id,
                equipment.equipment_type.as_str(),
                equipment.equipment_reference,
                equipment.status,
                equipment.brand_model,
            ],
        )?;
        Ok(())
    }

    /// Get equipment by ID.
    pub fn get_equipment(&self, id: &str) -> DbResult<Option<Equipment>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, equipment_type, equipment_reference, status, brand_model
                FROM equipment
                WHERE id = ?
                "#,
                [id],
                read_equipment_row,
            )
            .optional()?;
        Ok(row.map(Into::into))
    }

    /// List equipment ordered by reference, optionally restricted to one type.
    pub fn list_equipment_by_type(
        &self,
        equipment_type: Option<&EquipmentType>,
    ) -> DbResult<Vec<Equipment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, equipment_type, equipment_reference, status, brand_model
            FROM equipment
            WHERE ?1 IS NULL OR equipment_type = ?1
            ORDER BY equipment_reference
            "#,
        )?;

        let rows = stmt.query_map(
            params![equipment_type.map(|t| t.as_str())],
            read_equipment_row,
        )?;

        let mut equipment = Vec::new();
        for row in rows {
            equipment.push(row?.into());
        }
        Ok(equipment)
    }

    /// Set or clear the manual status of a piece of equipment.
    pub fn set_equipment_status(&self, id: &str, status: Option<&str>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE equipment SET status = ?, updated_at = datetime('now') WHERE id = ?",
            params![status, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete equipment and its calibrations.
    pub fn delete_equipment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM equipment WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct EquipmentRow {
    id: String,
    equipment_type: String,
    equipment_reference: String,
    status: Option<String>,
    brand_model: Option<String>,
}

fn read_equipment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EquipmentRow> {
    Ok(EquipmentRow {
        id: row.get(0)?,
        equipment_type: row.get(1)?,
        equipment_reference: row.get(2)?,
        status: row.get(3)?,
        brand_model: row.get(4)?,
    })
}

impl From<EquipmentRow> for Equipment {
    fn from(row: EquipmentRow) -> Self {
        Equipment {
            id: row.id,
            equipment_type: EquipmentType::from(row.equipment_type),
            equipment_reference: row.equipment_reference,
            status: row.status,
            brand_model: row.brand_model,
        }
    }
}
