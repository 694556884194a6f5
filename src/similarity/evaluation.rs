// src/similarity/evaluation.rs - Measuring scorer quality on labelled pairs
use serde::{Deserialize, Serialize};
use std::fmt;

/// The threshold sweep visits `SWEEP_STEPS` values from `SWEEP_START` upward.
pub const SWEEP_START: f64 = 0.50;
pub const SWEEP_STEP: f64 = 0.05;
pub const SWEEP_STEPS: usize = 10;

/// A name pair with a known answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPair {
    pub s1: String,
    pub s2: String,
    pub is_duplicate: bool,
}

/// Confusion matrix of duplicate predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl EvaluationMetrics {
    pub fn add_result(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, true) => self.false_negatives += 1,
            (false, false) => self.true_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1_score(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }

    pub fn false_positive_rate(&self) -> f64 {
        ratio(self.false_positives, self.false_positives + self.true_negatives)
    }

    pub fn false_negative_rate(&self) -> f64 {
        ratio(self.false_negatives, self.false_negatives + self.true_positives)
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Precision: {:.4}, Recall: {:.4}, F1: {:.4}, Accuracy: {:.4}, Specificity: {:.4}",
            self.precision(),
            self.recall(),
            self.f1_score(),
            self.accuracy(),
            self.specificity()
        )
    }
}

/// Confusion matrix for pre-computed `(score, is_duplicate)` pairs. A score at
/// or above `threshold` predicts a duplicate.
pub fn evaluate_scores(scored: &[(f64, bool)], threshold: f64) -> EvaluationMetrics {
    let mut metrics = EvaluationMetrics::default();
    for &(score, actual) in scored {
        metrics.add_result(score >= threshold, actual);
    }
    metrics
}

/// Scores every labelled pair with `score_fn` and evaluates at `threshold`.
pub fn evaluate<F>(pairs: &[LabeledPair], threshold: f64, score_fn: F) -> EvaluationMetrics
where
    F: Fn(&str, &str) -> f64,
{
    let scored: Vec<(f64, bool)> = pairs
        .iter()
        .map(|p| (score_fn(&p.s1, &p.s2), p.is_duplicate))
        .collect();
    evaluate_scores(&scored, threshold)
}

/// Thresholds 0.50, 0.55, ..., 0.95.
pub fn sweep_thresholds() -> impl Iterator<Item = f64> {
    (0..SWEEP_STEPS).map(|i| SWEEP_START + i as f64 * SWEEP_STEP)
}

/// Threshold with the best F1 over the sweep; the lowest wins ties. Falls
/// back to the first threshold when nothing scores above zero.
pub fn optimal_threshold(scored: &[(f64, bool)]) -> (f64, EvaluationMetrics) {
    let mut best = (SWEEP_START, evaluate_scores(scored, SWEEP_START));
    for threshold in sweep_thresholds().skip(1) {
        let metrics = evaluate_scores(scored, threshold);
        if metrics.f1_score() > best.1.f1_score() {
            best = (threshold, metrics);
        }
    }
    best
}
