//! Classification and distribution-similarity metrics.
//!
//! Precision and recall follow the "zero division counts as perfect"
//! convention: with no predicted positives precision is 1.0, with no actual
//! positives recall is 1.0.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Accuracy, precision, recall and F1 of a binary labelling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScore {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Similarity between two distributions over the same positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionScore {
    /// Square-root Jensen-Shannon divergence, base 2 (0 = identical, 1 = disjoint)
    pub divergence: f64,
    /// 1-D Wasserstein distance with indices as positions
    pub earth_mover: f64,
    pub cosine: f64,
}

/// Binary confusion matrix tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
}

impl ConfusionCounts {
    pub fn from_observations(y_true: &[bool], y_pred: &[bool]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::LengthMismatch {
                left: y_true.len(),
                right: y_pred.len(),
            });
        }

        let mut counts = Self::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth, pred) {
                (true, true) => counts.true_positive += 1,
                (false, true) => counts.false_positive += 1,
                (true, false) => counts.false_negative += 1,
                (false, false) => counts.true_negative += 1,
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f64 / total as f64
    }

    pub fn precision(&self) -> f64 {
        ratio_or_one(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio_or_one(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }
}

fn ratio_or_one(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Score predicted labels against ground truth.
pub fn classification_score(y_true: &[bool], y_pred: &[bool]) -> Result<ClassificationScore> {
    let counts = ConfusionCounts::from_observations(y_true, y_pred)?;
    if counts.total() == 0 {
        return Err(Error::EmptySequence);
    }

    Ok(ClassificationScore {
        accuracy: counts.accuracy(),
        precision: counts.precision(),
        recall: counts.recall(),
        f1: counts.f1(),
    })
}

/// Divide every entry by the total.
pub fn normalize(counts: &[f64]) -> Result<Vec<f64>> {
    validate(counts)?;
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return Err(Error::EmptyDistribution);
    }
    Ok(counts.iter().map(|c| c / total).collect())
}

fn validate(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::EmptySequence);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(Error::InvalidDistribution(format!(
            "entries must be finite and non-negative, found {bad}"
        )));
    }
    Ok(())
}

/// Compare two non-negative vectors of equal length.
///
/// Each vector is normalized by its own sum before the divergence and the
/// earth mover's distance are computed, so raw counts are accepted. A vector
/// summing to zero has no distribution and yields
/// [`Error::EmptyDistribution`].
pub fn distribution_similarity(dist1: &[f64], dist2: &[f64]) -> Result<DistributionScore> {
    if dist1.len() != dist2.len() {
        return Err(Error::LengthMismatch {
            left: dist1.len(),
            right: dist2.len(),
        });
    }
    let p = normalize(dist1)?;
    let q = normalize(dist2)?;

    Ok(DistributionScore {
        divergence: jensen_shannon(&p, &q),
        earth_mover: earth_mover(&p, &q),
        cosine: cosine(dist1, dist2),
    })
}

fn jensen_shannon(p: &[f64], q: &[f64]) -> f64 {
    let mut divergence = 0.0;
    for (&pi, &qi) in p.iter().zip(q) {
        let mi = 0.5 * (pi + qi);
        if pi > 0.0 {
            divergence += 0.5 * pi * (pi / mi).log2();
        }
        if qi > 0.0 {
            divergence += 0.5 * qi * (qi / mi).log2();
        }
    }
    divergence.max(0.0).sqrt()
}

fn earth_mover(p: &[f64], q: &[f64]) -> f64 {
    let mut cdf_gap = 0.0;
    let mut distance = 0.0;
    // Mass carried past position i moves one unit to reach i + 1.
    for (&pi, &qi) in p.iter().zip(q).take(p.len().saturating_sub(1)) {
        cdf_gap += pi - qi;
        distance += cdf_gap.abs();
    }
    distance
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    dot / (norm_a * norm_b)
}
