//! Index maintenance.

use super::{Database, DbResult, INDEXES, INDEX_NAMES};

impl Database {
    /// Create any missing secondary index. Safe to run repeatedly.
    ///
    /// Returns the names of the indexes that were created.
    pub fn ensure_indexes(&self) -> DbResult<Vec<String>> {
        let before = self.list_indexes()?;
        self.conn.execute_batch(INDEXES)?;

        let created: Vec<String> = INDEX_NAMES
            .iter()
            .filter(|name| !before.iter().any(|b| b == *name))
            .map(|name| name.to_string())
            .collect();
        if created.is_empty() {
            tracing::info!("all indexes present");
        } else {
            tracing::info!(created = ?created, "created missing indexes");
        }
        Ok(created)
    }

    /// Names of the secondary indexes currently in the database.
    pub fn list_indexes(&self) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'index' AND name LIKE 'idx_%'
            ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Rebuild every index and refresh query planner statistics.
    pub fn rebuild_indexes(&self) -> DbResult<usize> {
        let count = self.ensure_indexes().map(|_| INDEX_NAMES.len())?;
        self.conn.execute_batch("REINDEX; ANALYZE;")?;
        tracing::info!(indexes = count, "rebuilt indexes");
        Ok(count)
    }
}
