use super::models::{DirRecord, FileRecord};
use super::sqlite::Database;
use rusqlite::{params, Result, Row};
use tracing::debug;

const FILE_COLUMNS: &str =
    "id, abs_path, leaf_name, parent_dir, file_size, fingerprint, status, score";

fn file_from_row(row: &Row<'_>) -> Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        abs_path: row.get(1)?,
        leaf_name: row.get(2)?,
        parent_dir: row.get(3)?,
        file_size: row.get(4)?,
        fingerprint: row.get(5)?,
        status: row.get(6)?,
        score: row.get(7)?,
    })
}

impl Database {
    // ── File Records ─────────────────────────────────────────────

    /// Create-or-replace keyed by `abs_path`.
    ///
    /// Operator-asserted statuses are protected at the SQL level: when the
    /// stored row is blessed/cursed and the incoming status is not, the
    /// stored status, score, and fingerprint survive while the factual
    /// columns (size, names) still refresh. Use [`Database::replace_file`]
    /// for an explicit re-bless/re-curse.
    pub fn upsert_file(&self, file: &FileRecord) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO file_record \
             (abs_path, leaf_name, parent_dir, file_size, fingerprint, status, score, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(abs_path) DO UPDATE SET \
                 leaf_name = excluded.leaf_name, \
                 parent_dir = excluded.parent_dir, \
                 file_size = excluded.file_size, \
                 fingerprint = CASE \
                     WHEN file_record.status IN ('blessed', 'cursed') \
                          AND excluded.status NOT IN ('blessed', 'cursed') \
                     THEN file_record.fingerprint ELSE excluded.fingerprint END, \
                 status = CASE \
                     WHEN file_record.status IN ('blessed', 'cursed') \
                          AND excluded.status NOT IN ('blessed', 'cursed') \
                     THEN file_record.status ELSE excluded.status END, \
                 score = CASE \
                     WHEN file_record.status IN ('blessed', 'cursed') \
                          AND excluded.status NOT IN ('blessed', 'cursed') \
                     THEN file_record.score ELSE excluded.score END, \
                 updated_at = excluded.updated_at",
            params![
                file.abs_path,
                file.leaf_name,
                file.parent_dir,
                file.file_size,
                file.fingerprint,
                file.status,
                file.score,
                now,
            ],
        )?;
        Ok(())
    }

    /// Unconditional create-or-replace. This is the only write path allowed
    /// to change a blessed/cursed row.
    pub fn replace_file(&self, file: &FileRecord) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO file_record \
             (abs_path, leaf_name, parent_dir, file_size, fingerprint, status, score, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(abs_path) DO UPDATE SET \
                 leaf_name = excluded.leaf_name, \
                 parent_dir = excluded.parent_dir, \
                 file_size = excluded.file_size, \
                 fingerprint = excluded.fingerprint, \
                 status = excluded.status, \
                 score = excluded.score, \
                 updated_at = excluded.updated_at",
            params![
                file.abs_path,
                file.leaf_name,
                file.parent_dir,
                file.file_size,
                file.fingerprint,
                file.status,
                file.score,
                now,
            ],
        )?;
        Ok(())
    }

    /// Write back a freshly computed fingerprint onto an existing record.
    /// Returns the number of rows touched (0 when the path is not cataloged).
    pub fn update_fingerprint(&self, abs_path: &str, fingerprint: &str) -> Result<usize> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "UPDATE file_record SET fingerprint = ?2, updated_at = ?3 WHERE abs_path = ?1",
            params![abs_path, fingerprint, now],
        )
    }

    pub fn find_by_path(&self, abs_path: &str) -> Result<Option<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM file_record WHERE abs_path = ?1",
            FILE_COLUMNS
        );
        match self
            .connection()
            .query_row(&sql, params![abs_path], file_from_row)
        {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All records sharing `fingerprint`, excluding the query path itself.
    /// Ordered by path so repeated passes accumulate scores identically.
    pub fn find_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_path: &str,
    ) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM file_record \
             WHERE fingerprint = ?1 AND abs_path != ?2 \
             ORDER BY abs_path",
            FILE_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let records = stmt
            .query_map(params![fingerprint, exclude_path], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    /// All records sharing `leaf_name`, excluding the query path itself.
    pub fn find_by_name(&self, leaf_name: &str, exclude_path: &str) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM file_record \
             WHERE leaf_name = ?1 AND abs_path != ?2 \
             ORDER BY abs_path",
            FILE_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let records = stmt
            .query_map(params![leaf_name, exclude_path], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn list_files(&self) -> Result<Vec<FileRecord>> {
        let sql = format!("SELECT {} FROM file_record ORDER BY abs_path", FILE_COLUMNS);
        let mut stmt = self.connection().prepare(&sql)?;
        let records = stmt
            .query_map([], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count_files(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM file_record", [], |row| row.get(0))
    }

    /// Explicit removal. The catalog never evicts records on its own, even
    /// for files that have vanished from disk.
    pub fn delete_file(&self, abs_path: &str) -> Result<bool> {
        let deleted = self.connection().execute(
            "DELETE FROM file_record WHERE abs_path = ?1",
            params![abs_path],
        )?;
        Ok(deleted > 0)
    }

    // ── Directory Records ────────────────────────────────────────

    pub fn upsert_dirs(&self, dirs: &[DirRecord]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO dir_record (abs_path, leaf_name, parent_dir) \
                 VALUES (?1, ?2, ?3) \
                 ON CONFLICT(abs_path) DO UPDATE SET \
                     leaf_name = excluded.leaf_name, \
                     parent_dir = excluded.parent_dir",
            )?;
            for dir in dirs {
                count += stmt.execute(params![dir.abs_path, dir.leaf_name, dir.parent_dir])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} directory records", count);
        Ok(count)
    }

    pub fn list_dirs(&self) -> Result<Vec<DirRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, abs_path, leaf_name, parent_dir FROM dir_record ORDER BY abs_path",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(DirRecord {
                    id: row.get(0)?,
                    abs_path: row.get(1)?,
                    leaf_name: row.get(2)?,
                    parent_dir: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }
}
