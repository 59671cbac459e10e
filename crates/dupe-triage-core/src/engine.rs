use crate::classify::{self, Candidate, Outcome, SnapshotCorpus, ThresholdMode, Thresholds};
use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::fingerprint::{self, FingerprintCache};
use crate::progress::ProgressReporter;
use crate::scanner::{self, DirArena};
use crate::storage::models::{FileRecord, Status};
use crate::storage::Database;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// The classification engine plus the collaborators it drives: the catalog
/// and, when it could be opened, the fingerprint cache. No ambient globals;
/// callers construct one and pass it around.
pub struct TriageEngine {
    config: AppConfig,
    catalog: Database,
    cache: Option<FingerprintCache>,
}

/// Per-status tallies for one pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusCounts {
    pub good: usize,
    pub nuke: usize,
    pub check: usize,
    pub not_sure: usize,
    pub unknown: usize,
    pub blessed: usize,
    pub cursed: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: Status) {
        match status {
            Status::Good => self.good += 1,
            Status::Nuke => self.nuke += 1,
            Status::Check => self.check += 1,
            Status::NotSure => self.not_sure += 1,
            Status::Unknown => self.unknown += 1,
            Status::Blessed => self.blessed += 1,
            Status::Cursed => self.cursed += 1,
        }
    }
}

#[derive(Debug)]
pub struct PassResult {
    pub walk_duration: Duration,
    pub fingerprint_duration: Duration,
    pub classify_duration: Duration,
    pub persist_duration: Duration,
    pub files_walked: usize,
    pub files_classified: usize,
    pub counts: StatusCounts,
    pub io_errors: usize,
    pub persist_errors: usize,
}

impl TriageEngine {
    /// Open the catalog and fingerprint cache named in `config`. A cache
    /// that fails to open is logged and dropped; every lookup then misses
    /// and files are hashed directly.
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let catalog = Database::open(&config.catalog_path)?;
        let cache = match FingerprintCache::open(&config.fingerprint_cache_path) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Fingerprint cache unavailable, hashing without it: {}", e);
                None
            }
        };
        Ok(TriageEngine {
            config,
            catalog,
            cache,
        })
    }

    /// Assemble an engine from already-open collaborators.
    pub fn with_catalog(
        config: AppConfig,
        catalog: Database,
        cache: Option<FingerprintCache>,
    ) -> Self {
        TriageEngine {
            config,
            catalog,
            cache,
        }
    }

    pub fn catalog(&self) -> &Database {
        &self.catalog
    }

    pub fn cache(&self) -> Option<&FingerprintCache> {
        self.cache.as_ref()
    }

    /// Run a full triage pass over the configured root paths:
    /// 1. walk the roots (candidate files + directory inventory)
    /// 2. resolve fingerprints in parallel (cache, then catalog, then hash)
    /// 3. score each candidate serially against a corpus snapshot
    /// 4. map scores to statuses and persist the records
    pub fn run_pass(&self, reporter: &dyn ProgressReporter) -> Result<PassResult, Error> {
        let mut roots = Vec::new();
        for root in config::non_overlapping_directories(self.config.root_paths.clone()) {
            match fs::canonicalize(&root) {
                Ok(canonical) => roots.push(canonical.to_string_lossy().into_owned()),
                Err(e) => error!("Skipping unreadable root '{}': {}", root, e),
            }
        }
        if roots.is_empty() {
            return Err(Error::Other("no usable root paths configured".to_string()));
        }
        info!("Processing directories: {:?}", roots);

        let root_slices: Vec<&str> = roots.iter().map(|s| s.as_str()).collect();
        let ignore_slices: Vec<&str> = self
            .config
            .ignore_patterns
            .iter()
            .map(|s| s.as_str())
            .collect();

        // Phase 1: walk
        reporter.on_walk_start();
        let walk_start = Instant::now();
        let outcome = scanner::walk_roots(&root_slices, &ignore_slices)?;
        let walk_duration = walk_start.elapsed();
        let files_walked = outcome.files.len();
        reporter.on_walk_complete(files_walked, walk_duration.as_secs_f64());
        debug!(
            "Walk completed in {:.2}s — {} files, {} directories",
            walk_duration.as_secs_f64(),
            files_walked,
            outcome.dirs.len(),
        );

        let arena = DirArena::from_paths(outcome.dirs);
        self.catalog.upsert_dirs(arena.records())?;

        let history = self.catalog.list_files()?;
        let history_by_path: HashMap<String, FileRecord> = history
            .iter()
            .map(|r| (r.abs_path.clone(), r.clone()))
            .collect();

        let mut candidates: Vec<Candidate> = outcome
            .files
            .iter()
            .map(|file| {
                let status = history_by_path
                    .get(&file.abs_path)
                    .map(|r| r.status)
                    .unwrap_or(Status::Unknown);
                Candidate::from_parts(file.abs_path.clone(), file.size as i64, None, status)
            })
            .collect();

        // Phase 2: fingerprints. Hashing parallelizes across independent
        // files; scoring below waits until the whole batch is resolved.
        reporter.on_fingerprint_start();
        let fingerprint_start = Instant::now();
        let total = candidates.len();
        let done = AtomicUsize::new(0);
        let cache = self.cache.as_ref();
        let failures: Vec<bool> = candidates
            .par_iter_mut()
            .map(|candidate| {
                let prior = history_by_path.get(&candidate.abs_path);
                let result = resolve_for_batch(candidate, prior, cache);
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_fingerprint_progress(completed, total);
                match result {
                    Ok(()) => false,
                    Err(e) => {
                        error!("Fingerprint failed for '{}': {}", candidate.abs_path, e);
                        true
                    }
                }
            })
            .collect();
        let mut failure_flags = failures.into_iter();
        candidates.retain(|_| !failure_flags.next().unwrap_or(false));
        let io_errors = total - candidates.len();
        let fingerprint_duration = fingerprint_start.elapsed();
        reporter.on_fingerprint_complete(candidates.len(), fingerprint_duration.as_secs_f64());

        // Phase 3: classify against a snapshot of history + the batch
        reporter.on_classify_start();
        let classify_start = Instant::now();
        let snapshot = SnapshotCorpus::with_history(
            history,
            candidates.iter().map(Candidate::to_record).collect(),
        );

        let mut classifications = Vec::with_capacity(candidates.len());
        for candidate in candidates.iter_mut() {
            let result = classify::classify(candidate, &snapshot, |c| {
                fingerprint::compute(Path::new(&c.abs_path)).map_err(Error::from)
            });
            match result {
                Ok(classification) => classifications.push(Some(classification)),
                Err(e) => {
                    error!("Classification failed for '{}': {}", candidate.abs_path, e);
                    classifications.push(None);
                }
            }
        }
        let classify_duration = classify_start.elapsed();
        reporter.on_classify_complete(candidates.len(), classify_duration.as_secs_f64());

        let thresholds = match self.config.threshold_mode {
            ThresholdMode::Fixed => {
                Thresholds::fixed(self.config.lower_threshold, self.config.upper_threshold)
            }
            ThresholdMode::PopulationRelative => {
                let scores: Vec<i64> = classifications
                    .iter()
                    .flatten()
                    .filter(|c| c.outcome == Outcome::Scored)
                    .map(|c| c.score)
                    .collect();
                Thresholds::population_relative(&scores)
            }
        };
        debug!(
            "Thresholds for this pass: lower {:.1}, upper {:.1}",
            thresholds.lower, thresholds.upper
        );

        // Phase 4: persist
        reporter.on_persist_start();
        let persist_start = Instant::now();
        let mut counts = StatusCounts::default();
        let mut persist_errors = 0usize;
        let mut files_classified = 0usize;

        for (candidate, classification) in candidates.iter().zip(classifications.iter()) {
            let Some(classification) = classification else {
                continue;
            };
            let (status, score) = match classification.outcome {
                Outcome::Authoritative(status) => {
                    // The catalog already holds the operator's assertion;
                    // nothing to rewrite.
                    counts.bump(status);
                    files_classified += 1;
                    continue;
                }
                Outcome::Demoted(_) => {
                    if let Some(cache) = &self.cache {
                        cache.invalidate(&candidate.abs_path);
                    }
                    (Status::Unknown, 0)
                }
                Outcome::Scored => (thresholds.assign(classification.score), classification.score),
            };

            let mut record = candidate.to_record();
            record.status = status;
            record.score = Some(score);

            if let Err(e) = self.catalog.upsert_file(&record) {
                error!("Catalog upsert failed for '{}': {}", record.abs_path, e);
                persist_errors += 1;
                continue;
            }
            counts.bump(status);
            files_classified += 1;
        }
        let persist_duration = persist_start.elapsed();
        reporter.on_persist_complete(files_classified, persist_duration.as_secs_f64());

        Ok(PassResult {
            walk_duration,
            fingerprint_duration,
            classify_duration,
            persist_duration,
            files_walked,
            files_classified,
            counts,
            io_errors,
            persist_errors,
        })
    }

    /// Classify a single file against the catalog and persist the outcome.
    /// Uses the configured fixed thresholds; population-relative bounds need
    /// a batch to be relative to.
    pub fn classify_path(
        &self,
        path: &Path,
        status_hint: Option<Status>,
    ) -> Result<(Status, i64), Error> {
        let mut candidate = Candidate::from_path(path)?;
        let prior = self.catalog.find_by_path(&candidate.abs_path)?;
        candidate.status = status_hint
            .or_else(|| prior.as_ref().map(|r| r.status))
            .unwrap_or(Status::Unknown);

        let classification = match classify::classify(&mut candidate, &self.catalog, |c| {
            self.resolve_fingerprint(c)
        }) {
            Ok(classification) => classification,
            Err(Error::Catalog(e)) => {
                error!(
                    "Catalog read failed while reconciling '{}': {}",
                    candidate.abs_path, e
                );
                return Ok((Status::Unknown, 0));
            }
            Err(e) => return Err(e),
        };

        let thresholds =
            Thresholds::fixed(self.config.lower_threshold, self.config.upper_threshold);
        let (status, score) = match classification.outcome {
            Outcome::Authoritative(status) => {
                // A hint that asserts a new operator decision goes through
                // the one write path allowed to set it; an adopted decision
                // is already on record.
                if prior.as_ref().map(|r| r.status) != Some(status) {
                    self.set_authoritative_status(path, status)?;
                }
                return Ok((status, classification.score));
            }
            Outcome::Demoted(_) => {
                if let Some(cache) = &self.cache {
                    cache.invalidate(&candidate.abs_path);
                }
                (Status::Unknown, 0)
            }
            Outcome::Scored => (thresholds.assign(classification.score), classification.score),
        };

        let mut record = candidate.to_record();
        record.status = status;
        record.score = Some(score);
        if let Err(e) = self.catalog.upsert_file(&record) {
            error!("Catalog upsert failed for '{}': {}", record.abs_path, e);
        }

        Ok((status, score))
    }

    /// Assert an operator decision on one file. This is the only path that
    /// may replace an existing blessed/cursed record.
    pub fn set_authoritative_status(
        &self,
        path: &Path,
        status: Status,
    ) -> Result<FileRecord, Error> {
        if !status.is_authoritative() {
            return Err(Error::Other(format!(
                "'{}' is not an operator-asserted status",
                status
            )));
        }

        let mut candidate = Candidate::from_path(path)?;
        if candidate.fingerprint.is_none() {
            candidate.fingerprint = Some(self.resolve_fingerprint(&candidate)?);
        }

        let mut record = candidate.to_record();
        record.status = status;
        record.score = Some(classify::sentinel_score(status));
        self.catalog.replace_file(&record)?;
        Ok(record)
    }

    /// Assert an operator decision on every regular file under `dir`.
    /// Per-file failures are logged and skipped; the count of records
    /// actually written is returned.
    pub fn mark_tree(&self, dir: &Path, status: Status) -> Result<usize, Error> {
        if !status.is_authoritative() {
            return Err(Error::Other(format!(
                "'{}' is not an operator-asserted status",
                status
            )));
        }
        let root = fs::canonicalize(dir)?;
        let root_str = root
            .to_str()
            .ok_or_else(|| Error::Other(format!("non-UTF-8 path: {}", root.display())))?;
        let ignore_slices: Vec<&str> = self
            .config
            .ignore_patterns
            .iter()
            .map(|s| s.as_str())
            .collect();

        let outcome = scanner::walk_roots(&[root_str], &ignore_slices)?;
        let mut marked = 0usize;
        for file in &outcome.files {
            match self.set_authoritative_status(Path::new(&file.abs_path), status) {
                Ok(record) => {
                    info!("{} > {}", status, record.abs_path);
                    marked += 1;
                }
                Err(e) => error!("Could not mark '{}' as {}: {}", file.abs_path, status, e),
            }
        }
        Ok(marked)
    }

    /// Remove a record from the catalog. Works on the stored key, so files
    /// already gone from disk can still be dropped. Returns whether a
    /// record existed.
    pub fn remove(&self, abs_path: &str) -> Result<bool, Error> {
        Ok(self.catalog.delete_file(abs_path)?)
    }

    /// Resolve the trusted fingerprint for a file, cheapest source first:
    /// cache hit (cross-checked against the catalog record's size), then
    /// the catalog record (only while its size matches on-disk), then a
    /// full hash that is written back to cache and catalog.
    fn resolve_fingerprint(&self, candidate: &Candidate) -> Result<String, Error> {
        let prior = self.catalog.find_by_path(&candidate.abs_path)?;
        let size_matches = prior
            .as_ref()
            .map(|r| r.file_size == candidate.size)
            .unwrap_or(true);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lookup(&candidate.abs_path) {
                if size_matches {
                    return Ok(hit);
                }
                debug!(
                    "Stale cache entry for '{}' (size changed since caching), ignoring",
                    candidate.abs_path
                );
            }
        }

        if let Some(record) = &prior {
            if let Some(stored) = &record.fingerprint {
                if size_matches {
                    if let Some(cache) = &self.cache {
                        cache.store(&candidate.abs_path, stored);
                    }
                    return Ok(stored.clone());
                }
                warn!(
                    "Inconsistent record for '{}': catalog size {} != on-disk {}, discarding stored fingerprint",
                    candidate.abs_path, record.file_size, candidate.size
                );
            }
        }

        let computed = fingerprint::compute(Path::new(&candidate.abs_path))?;
        if let Some(cache) = &self.cache {
            cache.store(&candidate.abs_path, &computed);
        }
        if prior.is_some() && size_matches {
            self.catalog
                .update_fingerprint(&candidate.abs_path, &computed)?;
        }
        Ok(computed)
    }
}

/// Batch-mode fingerprint resolution. Reads only the in-memory history
/// snapshot and the cache, so it can run across rayon workers while the
/// catalog connection stays on the pass thread. Write-back to the catalog
/// happens when the classified record is persisted.
fn resolve_for_batch(
    candidate: &mut Candidate,
    prior: Option<&FileRecord>,
    cache: Option<&FingerprintCache>,
) -> Result<(), std::io::Error> {
    // Authoritative candidates short-circuit to a sentinel and are never
    // hashed, but they keep their stored fingerprint so the rest of the
    // batch can still match against their content.
    if candidate.status.is_authoritative() {
        if let Some(record) = prior {
            if record.file_size == candidate.size {
                candidate.fingerprint = record.fingerprint.clone();
            }
        }
        return Ok(());
    }
    // A size mismatch demotes during classification; the stored fingerprint
    // is untrusted and a fresh hash would be discarded anyway.
    if let Some(record) = prior {
        if record.file_size != candidate.size {
            return Ok(());
        }
    }
    if candidate.fingerprint.is_some() {
        return Ok(());
    }

    if let Some(cache) = cache {
        if let Some(hit) = cache.lookup(&candidate.abs_path) {
            candidate.fingerprint = Some(hit);
            return Ok(());
        }
    }

    if let Some(record) = prior {
        if let Some(stored) = &record.fingerprint {
            if let Some(cache) = cache {
                cache.store(&candidate.abs_path, stored);
            }
            candidate.fingerprint = Some(stored.clone());
            return Ok(());
        }
    }

    let computed = fingerprint::compute(Path::new(&candidate.abs_path))?;
    if let Some(cache) = cache {
        cache.store(&candidate.abs_path, &computed);
    }
    candidate.fingerprint = Some(computed);
    Ok(())
}
