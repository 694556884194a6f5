// src/similarity/weights.rs
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::{ResolutionError, ResolutionResult};
pub use crate::models::similarity::SimilarityWeights;

/// Tolerance used when checking that weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self::defaults()
    }
}

impl SimilarityWeights {
    /// Empirically chosen defaults; they sum to 1.0.
    pub const fn defaults() -> Self {
        Self {
            jaro_winkler: 0.3,
            lcs: 0.2,
            phonetic: 0.2,
            ngram: 0.2,
            jaccard: 0.1,
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.jaro_winkler,
            self.lcs,
            self.phonetic,
            self.ngram,
            self.jaccard,
        ]
    }

    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            jaro_winkler: values[0],
            lcs: values[1],
            phonetic: values[2],
            ngram: values[3],
            jaccard: values[4],
        }
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Rescales the weights proportionally so they sum to 1.0. A vector that
    /// already sums to 1.0 within `WEIGHT_SUM_TOLERANCE`, or whose sum is zero
    /// or not finite, is left untouched.
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total == 0.0 || !total.is_finite() || (total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            return;
        }
        *self = Self::from_array(self.as_array().map(|w| w / total));
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Stable fingerprint of the exact weight values, used to key cached scores.
    pub fn signature(&self) -> WeightSignature {
        let mut hasher = Sha256::new();
        for w in self.as_array() {
            hasher.update(w.to_bits().to_le_bytes());
        }
        let digest = hasher.finalize();
        WeightSignature(hex::encode(&digest[..8]))
    }

    /// Parses five comma-separated weights in the order
    /// jaro_winkler, lcs, phonetic, ngram, jaccard.
    pub fn parse_list(raw: &str) -> ResolutionResult<Self> {
        let values: Vec<f64> = raw
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| ResolutionError::validation(format!("invalid weight list '{}': {}", raw, e)))?;
        let values: [f64; 5] = values.try_into().map_err(|v: Vec<f64>| {
            ResolutionError::validation(format!("expected 5 weights, got {}", v.len()))
        })?;
        Ok(Self::from_array(values))
    }
}

/// Hex prefix of the SHA-256 over a weight vector's IEEE-754 bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeightSignature(pub String);

impl fmt::Display for WeightSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes `weights` and rejects vectors that cannot be used: non-finite
/// or negative components, an all-zero vector, or any component outside
/// [0, 1] after normalization.
pub fn validate_weights(weights: &SimilarityWeights) -> ResolutionResult<SimilarityWeights> {
    if weights.as_array().iter().any(|w| !w.is_finite()) {
        return Err(ResolutionError::validation("weights must be finite numbers"));
    }
    if weights.as_array().iter().any(|&w| w < 0.0) {
        return Err(ResolutionError::validation(format!(
            "weights must not be negative, got {:?}",
            weights.as_array()
        )));
    }
    let total = weights.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(ResolutionError::validation(
            "weights must not sum to zero",
        ));
    }

    let normalized = weights.normalized();
    if normalized
        .as_array()
        .iter()
        .any(|w| !(0.0..=1.0).contains(w))
    {
        return Err(ResolutionError::validation(format!(
            "weights must be between 0 and 1 after normalization, got {:?}",
            normalized.as_array()
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_one(w: &SimilarityWeights) {
        assert!((w.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE, "sum was {}", w.sum());
    }

    #[test]
    fn test_defaults_sum_to_one() {
        let defaults = SimilarityWeights::default();
        assert_sums_to_one(&defaults);
        assert_eq!(defaults.jaro_winkler, 0.3);
        assert!(validate_weights(&defaults).is_ok());
    }

    #[test]
    fn test_normalize_rescales_proportionally() {
        let mut w = SimilarityWeights::from_array([1.0, 0.5, 0.3, 0.0, 0.2]);
        w.normalize();
        assert_sums_to_one(&w);
        assert!((w.jaro_winkler - 0.5).abs() < 1e-12);
        assert!((w.lcs - 0.25).abs() < 1e-12);
        assert_eq!(w.ngram, 0.0);
    }

    #[test]
    fn test_validate_accepts_normalized_vectors() {
        for raw in [
            [0.5, 0.3, 0.2, 0.0, 0.0],
            [3.0, 3.0, 3.0, 3.0, 3.0],
            [0.0, 0.0, 0.0, 0.0, 7.0],
            [0.1, 0.2, 0.3, 0.4, 0.5],
        ] {
            let validated = validate_weights(&SimilarityWeights::from_array(raw)).unwrap();
            assert_sums_to_one(&validated);
            assert!(validate_weights(&validated).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_malformed_vectors() {
        let negative = SimilarityWeights::from_array([-1.0, 2.0, 0.0, 0.0, 0.0]);
        assert!(validate_weights(&negative).unwrap_err().is_validation());

        let all_negative = SimilarityWeights::from_array([-1.0; 5]);
        assert!(validate_weights(&all_negative).unwrap_err().is_validation());

        let mixed_negative = SimilarityWeights::from_array([-0.1, -0.2, -0.3, -0.2, -0.2]);
        assert!(validate_weights(&mixed_negative).is_err());

        let zero = SimilarityWeights::from_array([0.0; 5]);
        assert!(validate_weights(&zero).is_err());

        let nan = SimilarityWeights::from_array([f64::NAN, 0.5, 0.5, 0.0, 0.0]);
        assert!(validate_weights(&nan).is_err());

        let infinite = SimilarityWeights::from_array([f64::INFINITY, 0.5, 0.5, 0.0, 0.0]);
        assert!(validate_weights(&infinite).is_err());
    }

    #[test]
    fn test_unit_sum_vectors_are_kept_bit_for_bit() {
        let defaults = SimilarityWeights::default();
        assert_eq!(defaults.normalized(), defaults);
        assert_eq!(validate_weights(&defaults).unwrap(), defaults);
        assert_eq!(
            validate_weights(&defaults).unwrap().signature(),
            defaults.signature()
        );

        let validated =
            validate_weights(&SimilarityWeights::from_array([0.1, 0.2, 0.3, 0.4, 0.5])).unwrap();
        assert_eq!(validate_weights(&validated).unwrap(), validated);
    }

    #[test]
    fn test_signature_distinguishes_weight_vectors() {
        let a = SimilarityWeights::default();
        let b = SimilarityWeights::from_array([0.2, 0.2, 0.2, 0.2, 0.2]);
        assert_eq!(a.signature(), SimilarityWeights::default().signature());
        assert_ne!(a.signature(), b.signature());
        assert_eq!(a.signature().0.len(), 16);
    }

    #[test]
    fn test_parse_list() {
        let w = SimilarityWeights::parse_list("0.3, 0.2,0.2,0.2,0.1").unwrap();
        assert_eq!(w, SimilarityWeights::default());
        assert!(SimilarityWeights::parse_list("0.3,0.2").is_err());
        assert!(SimilarityWeights::parse_list("a,b,c,d,e").is_err());
    }
}
