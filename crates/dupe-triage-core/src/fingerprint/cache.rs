use crate::error::Error;
use rocksdb::{IteratorMode, Options, DB};
use tracing::{debug, trace};

/// RocksDB-backed mapping of absolute path to content fingerprint.
///
/// Strictly an optimization: entries may be stale, so callers cross-check
/// the catalog record's size before trusting a hit, and every read/write
/// failure degrades to a miss rather than surfacing as an error.
pub struct FingerprintCache {
    db: DB,
}

impl FingerprintCache {
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        let db = DB::open(&db_options, path).map_err(|e| Error::Cache(e.to_string()))?;
        debug!("Using '{}' for fingerprint cache", path);
        Ok(FingerprintCache { db })
    }

    pub fn lookup(&self, abs_path: &str) -> Option<String> {
        match self.db.get(abs_path.as_bytes()) {
            Ok(Some(value)) => match bincode::deserialize::<String>(&value) {
                Ok(fingerprint) => {
                    trace!("Fingerprint cache hit for {}", abs_path);
                    Some(fingerprint)
                }
                Err(e) => {
                    debug!("Undecodable cache entry for {}: {}", abs_path, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!("Cache read failed for {}: {}", abs_path, e);
                None
            }
        }
    }

    pub fn store(&self, abs_path: &str, fingerprint: &str) {
        match bincode::serialize(fingerprint) {
            Ok(value) => {
                if let Err(e) = self.db.put(abs_path.as_bytes(), value) {
                    debug!("Cache write failed for {}: {}", abs_path, e);
                }
            }
            Err(e) => debug!("Cache encode failed for {}: {}", abs_path, e),
        }
    }

    /// Drop the entry for a path whose recorded identity no longer matches
    /// the file on disk.
    pub fn invalidate(&self, abs_path: &str) {
        if let Err(e) = self.db.delete(abs_path.as_bytes()) {
            debug!("Cache invalidation failed for {}: {}", abs_path, e);
        }
    }

    pub fn count(&self) -> usize {
        self.db.iterator(IteratorMode::Start).count()
    }

    pub fn clear(&self) -> Result<(), Error> {
        let mut batch = rocksdb::WriteBatch::default();
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, _) = item.map_err(|e| Error::Cache(e.to_string()))?;
            batch.delete(&key);
        }
        self.db
            .write(batch)
            .map_err(|e| Error::Cache(e.to_string()))?;
        Ok(())
    }
}
