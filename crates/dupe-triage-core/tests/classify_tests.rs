use dupe_triage_core::classify::{
    classify, Candidate, Mismatch, Outcome, SnapshotCorpus, Thresholds, BLESSED_SCORE,
    CURSED_SCORE,
};
use dupe_triage_core::error::Error;
use dupe_triage_core::storage::models::{FileRecord, Status};

const H1: &str = "aaaa000000000000000000000000000000000001";
const H2: &str = "bbbb000000000000000000000000000000000002";

fn record(path: &str, size: i64, fingerprint: Option<&str>, status: Status) -> FileRecord {
    let (parent_dir, leaf_name) = dupe_triage_core::storage::models::split_abs_path(path);
    FileRecord {
        id: 0,
        abs_path: path.to_string(),
        leaf_name,
        parent_dir,
        file_size: size,
        fingerprint: fingerprint.map(|f| f.to_string()),
        status,
        score: None,
    }
}

fn candidate(path: &str, size: i64, fingerprint: Option<&str>) -> Candidate {
    Candidate::from_parts(
        path.to_string(),
        size,
        fingerprint.map(|f| f.to_string()),
        Status::Unknown,
    )
}

fn resolve_to(fingerprint: &'static str) -> impl FnOnce(&Candidate) -> Result<String, Error> {
    move |_| Ok(fingerprint.to_string())
}

fn resolver_must_not_run(_: &Candidate) -> Result<String, Error> {
    panic!("fingerprint resolver should not be invoked");
}

#[test]
fn test_empty_corpus_is_good() {
    let corpus = SnapshotCorpus::new(vec![]);
    let mut cand = candidate("/fresh/file.txt", 10, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Scored);
    assert_eq!(result.score, -1);
    assert_eq!(Thresholds::default().assign(result.score), Status::Good);
}

#[test]
fn test_name_and_fingerprint_match_scores_1199() {
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Unknown)]);
    let mut cand = candidate("/b/x.txt", 10, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Scored);
    assert_eq!(result.score, 1199);
    assert_eq!(Thresholds::default().assign(result.score), Status::Nuke);
}

#[test]
fn test_fingerprint_match_against_cursed_record_doubles() {
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Cursed)]);
    let mut cand = candidate("/b/y.txt", 10, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.score, 1998);
    assert_eq!(Thresholds::default().assign(result.score), Status::Nuke);
}

#[test]
fn test_name_matches_alone_stay_below_check() {
    let corpus = SnapshotCorpus::new(vec![
        record("/a/x.txt", 10, Some(H1), Status::Unknown),
        record("/c/x.txt", 12, Some(H2), Status::Unknown),
    ]);
    let mut cand = candidate("/b/x.txt", 11, None);

    let result = classify(&mut cand, &corpus, resolve_to(
        "cccc000000000000000000000000000000000003",
    ))
    .unwrap();
    assert_eq!(result.score, 399);
    assert_eq!(Thresholds::default().assign(result.score), Status::NotSure);
}

#[test]
fn test_blessed_hint_short_circuits() {
    let corpus = SnapshotCorpus::new(vec![
        record("/a/x.txt", 10, Some(H1), Status::Unknown),
        record("/c/x.txt", 10, Some(H1), Status::Cursed),
    ]);
    let mut cand = candidate("/b/x.txt", 10, Some(H1));
    cand.status = Status::Blessed;

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Authoritative(Status::Blessed));
    assert_eq!(result.score, BLESSED_SCORE);
}

#[test]
fn test_cursed_hint_short_circuits() {
    let corpus = SnapshotCorpus::new(vec![]);
    let mut cand = candidate("/b/x.txt", 10, None);
    cand.status = Status::Cursed;

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Authoritative(Status::Cursed));
    assert_eq!(result.score, CURSED_SCORE);
}

#[test]
fn test_adopts_authoritative_status_from_prior_record() {
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Blessed)]);
    let mut cand = candidate("/a/x.txt", 10, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Authoritative(Status::Blessed));
    assert_eq!(result.score, BLESSED_SCORE);
    assert_eq!(cand.status, Status::Blessed);
}

#[test]
fn test_adopted_machine_status_is_rescored() {
    // A prior machine-derived status never blocks re-evaluation.
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Nuke)]);
    let mut cand = candidate("/a/x.txt", 10, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Scored);
    assert_eq!(result.score, -1);
}

#[test]
fn test_size_mismatch_demotes_to_unknown() {
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Good)]);
    let mut cand = candidate("/a/x.txt", 20, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Demoted(Mismatch::Size));
    assert_eq!(result.score, 0);
    assert_eq!(cand.status, Status::Unknown);
    assert_eq!(cand.fingerprint, None);
}

#[test]
fn test_hash_mismatch_demotes_to_unknown() {
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Good)]);
    let mut cand = candidate("/a/x.txt", 10, Some(H2));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Demoted(Mismatch::Hash));
    assert_eq!(result.score, 0);
    assert_eq!(cand.status, Status::Unknown);
    assert_eq!(cand.fingerprint, None);
}

#[test]
fn test_size_mismatch_wins_over_authoritative_prior() {
    // The candidate itself carries no authoritative hint; the prior record
    // is blessed but no longer describes what is on disk.
    let corpus = SnapshotCorpus::new(vec![record("/a/x.txt", 10, Some(H1), Status::Blessed)]);
    let mut cand = candidate("/a/x.txt", 99, None);

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    assert_eq!(result.outcome, Outcome::Demoted(Mismatch::Size));
    assert_eq!(result.score, 0);
}

#[test]
fn test_monotonic_escalation() {
    let one_match = SnapshotCorpus::new(vec![record("/a/1.bin", 10, Some(H1), Status::Unknown)]);
    let two_matches = SnapshotCorpus::new(vec![
        record("/a/1.bin", 10, Some(H1), Status::Unknown),
        record("/a/2.bin", 10, Some(H1), Status::Unknown),
    ]);

    let mut cand = candidate("/b/probe.bin", 10, Some(H1));
    let first = classify(&mut cand.clone(), &one_match, resolver_must_not_run).unwrap();
    let second = classify(&mut cand, &two_matches, resolver_must_not_run).unwrap();

    assert_eq!(first.score, 999);
    assert_eq!(second.score, 1999);
    assert!(second.score > first.score);
}

#[test]
fn test_classification_is_idempotent() {
    let corpus = SnapshotCorpus::new(vec![
        record("/a/x.txt", 10, Some(H1), Status::Cursed),
        record("/c/x.txt", 10, Some(H1), Status::Unknown),
    ]);

    let mut first_cand = candidate("/b/x.txt", 10, Some(H1));
    let mut second_cand = candidate("/b/x.txt", 10, Some(H1));
    let first = classify(&mut first_cand, &corpus, resolver_must_not_run).unwrap();
    let second = classify(&mut second_cand, &corpus, resolver_must_not_run).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_cursed_doubling_applies_in_path_order() {
    // Matches are visited in path order, so the cursed record at /a doubles
    // the running score before the plain match at /b is added.
    let corpus = SnapshotCorpus::new(vec![
        record("/a/dup.bin", 10, Some(H1), Status::Cursed),
        record("/b/dup.bin", 10, Some(H1), Status::Unknown),
    ]);
    let mut cand = candidate("/c/probe.bin", 10, Some(H1));

    let result = classify(&mut cand, &corpus, resolver_must_not_run).unwrap();
    // (-1 + 1000) * 2 + 1000 = 2998
    assert_eq!(result.score, 2998);
}

#[test]
fn test_resolver_runs_only_when_fingerprint_missing() {
    let corpus = SnapshotCorpus::new(vec![record("/a/x.bin", 10, Some(H1), Status::Unknown)]);

    let mut cand = candidate("/b/y.bin", 10, None);
    let result = classify(&mut cand, &corpus, resolve_to(H1)).unwrap();
    assert_eq!(result.score, 999);
    assert_eq!(cand.fingerprint.as_deref(), Some(H1));
}

#[test]
fn test_resolver_io_failure_fails_classification() {
    let corpus = SnapshotCorpus::new(vec![]);
    let mut cand = candidate("/b/y.bin", 10, None);

    let result = classify(&mut cand, &corpus, |_| {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        )))
    });
    assert!(result.is_err());
}
