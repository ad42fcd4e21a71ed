//! Sample database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{FilterSize, SampleDraft, SampleStatus};

const SAMPLE_COLUMNS: &str = r#"
    sample_id, shift_id, sampler, sample_number, is_field_blank, is_neg_air_exhaust,
    location, sample_type, pump, flowmeter, cowl_number, filter_size,
    start_time, end_time, next_day, initial_flowrate, final_flowrate,
    average_flowrate, notes, status, created_at, updated_at
"#;

impl Database {
    /// Insert a new sample.
    pub fn insert_sample(&self, sample: &SampleDraft) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO samples ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
                 ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
                SAMPLE_COLUMNS
            ),
            params![
                sample.sample_id,
                sample.shift_id,
                sample.sampler,
                sample.sample_number,
                sample.is_field_blank,
                sample.is_neg_air_exhaust,
                sample.location,
                sample.sample_type,
                sample.pump,
                sample.flowmeter,
                sample.cowl_number,
                sample.filter_size.as_str(),
                sample.start_time,
                sample.end_time,
                sample.next_day,
                sample.initial_flowrate,
                sample.final_flowrate,
                sample.average_flowrate,
                sample.notes,
                sample.status.as_str(),
                sample.created_at,
                sample.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing sample.
    pub fn update_sample(&self, sample: &SampleDraft) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE samples SET
                shift_id = ?2,
                sampler = ?3,
                sample_number = ?4,
                is_field_blank = ?5,
                is_neg_air_exhaust = ?6,
                location = ?7,
                sample_type = ?8,
                pump = ?9,
                flowmeter = ?10,
                cowl_number = ?11,
                filter_size = ?12,
                start_time = ?13,
                end_time = ?14,
                next_day = ?15,
                initial_flowrate = ?16,
                final_flowrate = ?17,
                average_flowrate = ?18,
                notes = ?19,
                status = ?20,
                updated_at = ?21
            WHERE sample_id = ?1
            "#,
            params![
                sample.sample_id,
                sample.shift_id,
                sample.sampler,
                sample.sample_number,
                sample.is_field_blank,
                sample.is_neg_air_exhaust,
                sample.location,
                sample.sample_type,
                sample.pump,
                sample.flowmeter,
                sample.cowl_number,
                sample.filter_size.as_str(),
                sample.start_time,
                sample.end_time,
                sample.next_day,
                sample.initial_flowrate,
                sample.final_flowrate,
                sample.average_flowrate,
                sample.notes,
                sample.status.as_str(),
                sample.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Insert the sample, or update it if it already exists.
    pub fn save_sample(&self, sample: &SampleDraft) -> DbResult<()> {
        if !self.update_sample(sample)? {
            self.insert_sample(sample)?;
        }
        Ok(())
    }

    /// Get a sample by ID.
    pub fn get_sample(&self, sample_id: &str) -> DbResult<Option<SampleDraft>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM samples WHERE sample_id = ?", SAMPLE_COLUMNS),
                [sample_id],
                read_sample_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List the samples of a shift in creation order.
    pub fn list_samples_for_shift(&self, shift_id: &str) -> DbResult<Vec<SampleDraft>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM samples WHERE shift_id = ? ORDER BY created_at, sample_number",
            SAMPLE_COLUMNS
        ))?;

        let rows = stmt.query_map([shift_id], read_sample_row)?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?.try_into()?);
        }
        Ok(samples)
    }

    /// Delete a sample.
    pub fn delete_sample(&self, sample_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM samples WHERE sample_id = ?", [sample_id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct SampleRow {
    sample_id: String,
    shift_id: Option<String>,
    sampler: String,
    sample_number: String,
    is_field_blank: bool,
    is_neg_air_exhaust: bool,
    location: String,
    sample_type: String,
    pump: Option<String>,
    flowmeter: Option<String>,
    cowl_number: String,
    filter_size: String,
    start_time: String,
    end_time: String,
    next_day: bool,
    initial_flowrate: String,
    final_flowrate: String,
    average_flowrate: String,
    notes: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn read_sample_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SampleRow> {
    Ok(SampleRow {
        sample_id: row.get(0)?,
        shift_id: row.get(1)?,
        sampler: row.get(2)?,
        sample_number: row.get(3)?,
        is_field_blank: row.get(4)?,
        is_neg_air_exhaust: row.get(5)?,
        location: row.get(6)?,
        sample_type: row.get(7)?,
        pump: row.get(8)?,
        flowmeter: row.get(9)?,
        cowl_number: row.get(10)?,
        filter_size: row.get(11)?,
        start_time: row.get(12)?,
        end_time: row.get(13)?,
        next_day: row.get(14)?,
        initial_flowrate: row.get(15)?,
        final_flowrate: row.get(16)?,
        average_flowrate: row.get(17)?,
        notes: row.get(18)?,
        status: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

impl TryFrom<SampleRow> for SampleDraft {
    type Error = DbError;

    fn try_from(row: SampleRow) -> Result<Self, Self::Error> {
        Ok(SampleDraft {
            sample_id: row.sample_id,
            shift_id: row.shift_id,
            sampler: row.sampler,
            sample_number: row.sample_number,
            is_field_blank: row.is_field_blank,
            is_neg_air_exhaust: row.is_neg_air_exhaust,
            location: row.location,
            sample_type: row.sample_type,
            pump: row.pump,
            flowmeter: row.flowmeter,
            cowl_number: row.cowl_number,
            filter_size: FilterSize::from(row.filter_size),
            start_time: row.start_time,
            end_time: row.end_time,
            next_day: row.next_day,
            initial_flowrate: row.initial_flowrate,
            final_flowrate: row.final_flowrate,
            average_flowrate: row.average_flowrate,
            notes: row.notes,
            status: string_to_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn string_to_status(s: &str) -> Result<SampleStatus, DbError> {
    match s {
        "pending" => Ok(SampleStatus::Pending),
        "failed" => Ok(SampleStatus::Failed),
        _ => Err(DbError::Constraint(format!("Unknown sample status: {}", s))),
    }
}
