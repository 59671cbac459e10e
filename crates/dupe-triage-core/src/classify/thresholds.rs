use crate::storage::models::Status;
use serde::Deserialize;

/// How score thresholds are derived for a classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Fixed lower/upper bounds from configuration.
    #[default]
    Fixed,
    /// Bounds at 80%/120% of the average strictly-positive score in the
    /// batch. Only meaningful for batch passes; single-file classification
    /// always uses the fixed bounds.
    PopulationRelative,
}

/// Score bounds that turn an accumulated score into a machine-derived status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub lower: f64,
    pub upper: f64,
}

impl Thresholds {
    pub const DEFAULT_LOWER: f64 = 400.0;
    pub const DEFAULT_UPPER: f64 = 900.0;

    pub fn fixed(lower: f64, upper: f64) -> Self {
        Thresholds { lower, upper }
    }

    /// Bounds relative to the batch: 80%/120% of the average over strictly
    /// positive scores, 0 if no score is positive.
    pub fn population_relative(scores: &[i64]) -> Self {
        let positive: Vec<i64> = scores.iter().copied().filter(|s| *s > 0).collect();
        let average = if positive.is_empty() {
            0.0
        } else {
            positive.iter().sum::<i64>() as f64 / positive.len() as f64
        };
        Thresholds {
            lower: 0.8 * average,
            upper: 1.2 * average,
        }
    }

    /// Map a score to a machine-derived status. Never called for
    /// blessed/cursed records. Exact boundary hits take the higher-severity
    /// bucket.
    pub fn assign(&self, score: i64) -> Status {
        if score < 0 {
            Status::Good
        } else if score as f64 >= self.upper {
            Status::Nuke
        } else if score as f64 >= self.lower {
            Status::Check
        } else {
            Status::NotSure
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds::fixed(Self::DEFAULT_LOWER, Self::DEFAULT_UPPER)
    }
}
