// src/models/similarity.rs
use serde::{Deserialize, Serialize};

/// Per-algorithm weights of the hybrid score. Semantically they sum to 1.0;
/// see `similarity::weights` for normalization and validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub jaro_winkler: f64,
    pub lcs: f64,
    pub phonetic: f64,
    pub ngram: f64,
    pub jaccard: f64,
}

/// A pair of names to compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub s1: String,
    pub s2: String,
}

impl SimilarityPair {
    pub fn new(s1: impl Into<String>, s2: impl Into<String>) -> Self {
        Self {
            s1: s1.into(),
            s2: s2.into(),
        }
    }
}

/// Individual metric outputs behind a hybrid score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub jaro_winkler: f64,
    pub lcs: f64,
    pub ngram_bigram: f64,
    pub ngram_trigram: f64,
    pub phonetic: f64,
    pub soundex_match: bool,
    pub metaphone_match: bool,
    pub jaccard: f64,
    pub weights: SimilarityWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub string1: String,
    pub string2: String,
    /// Hybrid score in [0, 1]; 1 means identical.
    pub similarity: f64,
    pub breakdown: Option<SimilarityBreakdown>,
}

/// Outcome for one pair of a batch. Exactly one of `similarity`/`error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScoreItem {
    pub string1: String,
    pub string2: String,
    pub similarity: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScoreResult {
    /// One item per input pair, in input order.
    pub items: Vec<BatchScoreItem>,
    pub scored_count: usize,
    pub rejected_count: usize,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub enabled: bool,
}
