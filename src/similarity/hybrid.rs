// src/similarity/hybrid.rs - Weighted combination of the individual metrics
use crate::errors::{ResolutionError, ResolutionResult};
use crate::models::similarity::{SimilarityBreakdown, SimilarityWeights};

use super::metrics::{
    jaro_winkler_similarity, lcs_similarity, ngram_similarity, normalize_text,
    phonetic_agreement, token_jaccard_similarity,
};
use super::weights::validate_weights;

/// Upper bound on pairs per batch request.
pub const MAX_BATCH_PAIRS: usize = 1000;

/// N used for the n-gram term of the hybrid score.
pub const HYBRID_NGRAM_SIZE: usize = 2;

/// Rejects pairs where either side is blank.
pub fn validate_pair(s1: &str, s2: &str) -> ResolutionResult<()> {
    if s1.trim().is_empty() {
        return Err(ResolutionError::validation("string1 must not be empty"));
    }
    if s2.trim().is_empty() {
        return Err(ResolutionError::validation("string2 must not be empty"));
    }
    Ok(())
}

/// Rejects empty batches and batches above `MAX_BATCH_PAIRS`.
pub fn validate_batch_len(len: usize) -> ResolutionResult<()> {
    if len == 0 {
        return Err(ResolutionError::validation(
            "pairs are required and must not be empty",
        ));
    }
    if len > MAX_BATCH_PAIRS {
        return Err(ResolutionError::validation(format!(
            "at most {} pairs are allowed per request, got {}",
            MAX_BATCH_PAIRS, len
        )));
    }
    Ok(())
}

/// `Σ weight_i * metric_i(s1, s2)`, clamped to [0, 1]. Metrics with zero
/// weight are not evaluated. Expects already validated weights.
pub fn hybrid_similarity(s1: &str, s2: &str, weights: &SimilarityWeights) -> f64 {
    let (a, b) = (normalize_text(s1), normalize_text(s2));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    // every metric is 1.0 here and normalized weights sum to one
    if a == b {
        return 1.0;
    }

    let mut similarity = 0.0;

    if weights.jaro_winkler > 0.0 {
        similarity += weights.jaro_winkler * jaro_winkler_similarity(s1, s2);
    }
    if weights.lcs > 0.0 {
        similarity += weights.lcs * lcs_similarity(s1, s2);
    }
    if weights.phonetic > 0.0 && phonetic_agreement(s1, s2).any() {
        similarity += weights.phonetic;
    }
    if weights.ngram > 0.0 {
        similarity += weights.ngram * ngram_similarity(s1, s2, HYBRID_NGRAM_SIZE);
    }
    if weights.jaccard > 0.0 {
        similarity += weights.jaccard * token_jaccard_similarity(s1, s2);
    }

    similarity.clamp(0.0, 1.0)
}

/// Every metric for a pair, alongside the weights that combine them.
pub fn similarity_breakdown(
    s1: &str,
    s2: &str,
    weights: &SimilarityWeights,
) -> SimilarityBreakdown {
    let phonetic = phonetic_agreement(s1, s2);
    SimilarityBreakdown {
        jaro_winkler: jaro_winkler_similarity(s1, s2),
        lcs: lcs_similarity(s1, s2),
        ngram_bigram: ngram_similarity(s1, s2, 2),
        ngram_trigram: ngram_similarity(s1, s2, 3),
        phonetic: if phonetic.any() { 1.0 } else { 0.0 },
        soundex_match: phonetic.soundex,
        metaphone_match: phonetic.metaphone,
        jaccard: token_jaccard_similarity(s1, s2),
        weights: *weights,
    }
}

/// Stateless scorer: validates input, applies default weights when none are
/// given, and computes the hybrid score.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridScorer {
    weights: SimilarityWeights,
}

impl HybridScorer {
    pub fn new(weights: Option<&SimilarityWeights>) -> ResolutionResult<Self> {
        let weights = match weights {
            Some(w) => validate_weights(w)?,
            None => SimilarityWeights::default(),
        };
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    pub fn score(&self, s1: &str, s2: &str) -> ResolutionResult<f64> {
        validate_pair(s1, s2)?;
        Ok(hybrid_similarity(s1, s2, &self.weights))
    }
}
