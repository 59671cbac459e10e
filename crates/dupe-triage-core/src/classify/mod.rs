mod corpus;
mod score;
mod thresholds;

pub use corpus::{Corpus, SnapshotCorpus};
pub use score::{
    classify, sentinel_score, Candidate, Classification, Mismatch, Outcome, BLESSED_SCORE,
    CURSED_SCORE,
};
pub use thresholds::{ThresholdMode, Thresholds};
