use crate::error::Error;
use crate::storage::models::FileRecord;
use crate::storage::Database;
use std::collections::HashMap;

/// The record set a file is scored against.
///
/// Implemented by the live catalog and by an in-memory snapshot, so the
/// matching logic is identical whether a file is reconciled against history
/// or against siblings discovered in the same walk.
pub trait Corpus {
    /// The prior record at the exact same absolute path, if any.
    fn match_by_path(&self, abs_path: &str) -> Result<Option<FileRecord>, Error>;

    /// Records with an identical content fingerprint, excluding the query
    /// path, in stable path order.
    fn match_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_path: &str,
    ) -> Result<Vec<FileRecord>, Error>;

    /// Records with an identical leaf name, excluding the query path, in
    /// stable path order.
    fn match_by_name(&self, leaf_name: &str, exclude_path: &str)
        -> Result<Vec<FileRecord>, Error>;
}

impl Corpus for Database {
    fn match_by_path(&self, abs_path: &str) -> Result<Option<FileRecord>, Error> {
        Ok(self.find_by_path(abs_path)?)
    }

    fn match_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_path: &str,
    ) -> Result<Vec<FileRecord>, Error> {
        Ok(self.find_by_fingerprint(fingerprint, exclude_path)?)
    }

    fn match_by_name(
        &self,
        leaf_name: &str,
        exclude_path: &str,
    ) -> Result<Vec<FileRecord>, Error> {
        Ok(self.find_by_name(leaf_name, exclude_path)?)
    }
}

/// Immutable corpus built before a batch is scored, so classification never
/// races against catalog writes made mid-pass.
///
/// Path lookups answer from `history` (what the catalog said when the pass
/// began); fingerprint and name matching answer from `current`, where a
/// batch candidate replaces its own stale history row. Records are held in
/// path order so accumulation is reproducible.
pub struct SnapshotCorpus {
    history: HashMap<String, FileRecord>,
    current: Vec<FileRecord>,
}

impl SnapshotCorpus {
    /// Snapshot over an explicit record list; the list is both history and
    /// current state.
    pub fn new(records: Vec<FileRecord>) -> Self {
        let history = records
            .iter()
            .map(|r| (r.abs_path.clone(), r.clone()))
            .collect();
        let mut current = records;
        current.sort_by(|a, b| a.abs_path.cmp(&b.abs_path));
        SnapshotCorpus { history, current }
    }

    /// Snapshot for a triage pass: `history` is the catalog as read at pass
    /// start, `candidates` are the records derived from the files on disk.
    pub fn with_history(history: Vec<FileRecord>, candidates: Vec<FileRecord>) -> Self {
        let history_map: HashMap<String, FileRecord> = history
            .into_iter()
            .map(|r| (r.abs_path.clone(), r))
            .collect();

        let mut merged: HashMap<String, FileRecord> = history_map.clone();
        for candidate in candidates {
            merged.insert(candidate.abs_path.clone(), candidate);
        }
        let mut current: Vec<FileRecord> = merged.into_values().collect();
        current.sort_by(|a, b| a.abs_path.cmp(&b.abs_path));

        SnapshotCorpus {
            history: history_map,
            current,
        }
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

impl Corpus for SnapshotCorpus {
    fn match_by_path(&self, abs_path: &str) -> Result<Option<FileRecord>, Error> {
        Ok(self.history.get(abs_path).cloned())
    }

    fn match_by_fingerprint(
        &self,
        fingerprint: &str,
        exclude_path: &str,
    ) -> Result<Vec<FileRecord>, Error> {
        Ok(self
            .current
            .iter()
            .filter(|r| r.abs_path != exclude_path && r.fingerprint.as_deref() == Some(fingerprint))
            .cloned()
            .collect())
    }

    fn match_by_name(
        &self,
        leaf_name: &str,
        exclude_path: &str,
    ) -> Result<Vec<FileRecord>, Error> {
        Ok(self
            .current
            .iter()
            .filter(|r| r.abs_path != exclude_path && r.leaf_name == leaf_name)
            .cloned()
            .collect())
    }
}
