use super::corpus::Corpus;
use crate::error::Error;
use crate::storage::models::{split_abs_path, FileRecord, Status};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Sentinel score returned for cursed records.
pub const CURSED_SCORE: i64 = 5000;
/// Sentinel score returned for blessed records.
pub const BLESSED_SCORE: i64 = -5000;

/// Evidence weight of an exact content match.
const FINGERPRINT_WEIGHT: i64 = 1000;
/// Evidence weight of a leaf-name match.
const NAME_WEIGHT: i64 = 200;

pub fn sentinel_score(status: Status) -> i64 {
    match status {
        Status::Cursed => CURSED_SCORE,
        Status::Blessed => BLESSED_SCORE,
        _ => 0,
    }
}

/// The live file being classified.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub abs_path: String,
    pub leaf_name: String,
    pub parent_dir: String,
    /// On-disk size at the time the candidate was built.
    pub size: i64,
    /// Resolved content fingerprint, if known yet.
    pub fingerprint: Option<String>,
    /// Current status going into classification (from the catalog record or
    /// an explicit hint); `Unknown` for a never-seen file.
    pub status: Status,
}

impl Candidate {
    /// Build a candidate from a file on disk. Fails with an IO error when
    /// the path cannot be canonicalized or stat'd.
    pub fn from_path(path: &Path) -> Result<Candidate, Error> {
        let canonical = fs::canonicalize(path)?;
        let metadata = fs::metadata(&canonical)?;
        let abs_path = canonical.to_string_lossy().into_owned();
        Ok(Candidate::from_parts(
            abs_path,
            metadata.len() as i64,
            None,
            Status::Unknown,
        ))
    }

    pub fn from_parts(
        abs_path: String,
        size: i64,
        fingerprint: Option<String>,
        status: Status,
    ) -> Candidate {
        let (parent_dir, leaf_name) = split_abs_path(&abs_path);
        Candidate {
            abs_path,
            leaf_name,
            parent_dir,
            size,
            fingerprint,
            status,
        }
    }

    pub fn to_record(&self) -> FileRecord {
        FileRecord {
            id: 0,
            abs_path: self.abs_path.clone(),
            leaf_name: self.leaf_name.clone(),
            parent_dir: self.parent_dir.clone(),
            file_size: self.size,
            fingerprint: self.fingerprint.clone(),
            status: self.status,
            score: None,
        }
    }
}

/// Self-identity inconsistency found while reconciling a candidate against
/// its own prior record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Recorded size differs from the on-disk size.
    Size,
    /// Live fingerprint differs from the recorded fingerprint.
    Hash,
}

/// How a classification was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Operator-asserted status held; score is the sentinel.
    Authoritative(Status),
    /// Inconsistent prior record; final status is `Unknown`, score 0,
    /// pending re-review on a later pass.
    Demoted(Mismatch),
    /// Evidence was accumulated; final status comes from the threshold
    /// policy.
    Scored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub outcome: Outcome,
    pub score: i64,
}

/// Classify one candidate against a corpus.
///
/// `resolve` supplies the content fingerprint when the candidate does not
/// carry one yet; it is only invoked if the accumulation step is reached.
///
/// The steps, in order:
/// 1. a blessed/cursed candidate short-circuits to its sentinel score;
/// 2. the candidate is reconciled against the record at its own path —
///    size or fingerprint disagreement demotes it to `Unknown` with score 0
///    rather than guessing whether disk or catalog is right, and an adopted
///    blessed/cursed status short-circuits like step 1;
/// 3. every *other* record with the same fingerprint adds 1000, every other
///    record with the same leaf name adds 200, and each match against a
///    cursed record doubles the running score. The base score of -1 keeps
///    "no evidence" distinguishable from a zero score.
pub fn classify<C, F>(
    candidate: &mut Candidate,
    corpus: &C,
    resolve: F,
) -> Result<Classification, Error>
where
    C: Corpus + ?Sized,
    F: FnOnce(&Candidate) -> Result<String, Error>,
{
    if candidate.status.is_authoritative() {
        return Ok(Classification {
            outcome: Outcome::Authoritative(candidate.status),
            score: sentinel_score(candidate.status),
        });
    }

    if let Some(prior) = corpus.match_by_path(&candidate.abs_path)? {
        if prior.file_size != candidate.size {
            warn!(
                "Size mismatch for '{}': recorded {} != on-disk {}, demoting for re-review",
                candidate.abs_path, prior.file_size, candidate.size
            );
            candidate.fingerprint = None;
            candidate.status = Status::Unknown;
            return Ok(Classification {
                outcome: Outcome::Demoted(Mismatch::Size),
                score: 0,
            });
        }

        if let (Some(live), Some(stored)) =
            (candidate.fingerprint.as_deref(), prior.fingerprint.as_deref())
        {
            if live != stored {
                warn!(
                    "Fingerprint mismatch for '{}': recorded {} != live {}, demoting for re-review",
                    candidate.abs_path, stored, live
                );
                candidate.fingerprint = None;
                candidate.status = Status::Unknown;
                return Ok(Classification {
                    outcome: Outcome::Demoted(Mismatch::Hash),
                    score: 0,
                });
            }
        }

        candidate.status = prior.status;
        if prior.status.is_authoritative() {
            return Ok(Classification {
                outcome: Outcome::Authoritative(prior.status),
                score: sentinel_score(prior.status),
            });
        }
    }

    let fingerprint = match candidate.fingerprint.clone() {
        Some(fingerprint) => fingerprint,
        None => {
            let fingerprint = resolve(candidate)?;
            candidate.fingerprint = Some(fingerprint.clone());
            fingerprint
        }
    };

    let mut score: i64 = -1;

    for other in corpus.match_by_fingerprint(&fingerprint, &candidate.abs_path)? {
        score += FINGERPRINT_WEIGHT;
        if other.status == Status::Cursed {
            score *= 2;
        }
    }

    for other in corpus.match_by_name(&candidate.leaf_name, &candidate.abs_path)? {
        score += NAME_WEIGHT;
        if other.status == Status::Cursed {
            score *= 2;
        }
    }

    Ok(Classification {
        outcome: Outcome::Scored,
        score,
    })
}
