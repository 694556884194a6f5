// src/similarity/service.rs - Scoring entry points used by calling services
use log::{debug, info};
use std::sync::{PoisonError, RwLock};

use crate::errors::{ResolutionError, ResolutionResult};
use crate::models::similarity::{
    BatchScoreItem, BatchScoreResult, CacheStats, SimilarityPair, SimilarityResult,
    SimilarityWeights,
};
use crate::utils::config::ResolutionConfig;

use super::cache::{SimilarityCache, DEFAULT_CACHE_SIZE};
use super::hybrid::{
    hybrid_similarity, similarity_breakdown, validate_batch_len, validate_pair, HybridScorer,
};

/// Where the stored weights live. Each variant holds them behind its own lock.
enum Scoring {
    Cached(SimilarityCache),
    Direct(RwLock<HybridScorer>),
}

/// Scores names with the hybrid scorer, optionally memoized.
///
/// Every method takes `&self`, so one service can be shared through an `Arc`;
/// weight changes take the exclusive lock of the cache or the scorer.
pub struct SimilarityService {
    scoring: Scoring,
}

impl SimilarityService {
    pub fn new(weights: SimilarityWeights, cache_capacity: usize) -> ResolutionResult<Self> {
        Ok(Self {
            scoring: Scoring::Cached(SimilarityCache::new(weights, cache_capacity)?),
        })
    }

    /// Uncached service with the default weights.
    pub fn disabled() -> Self {
        Self {
            scoring: Scoring::Direct(RwLock::new(HybridScorer::default())),
        }
    }

    fn uncached(weights: &SimilarityWeights) -> ResolutionResult<Self> {
        Ok(Self {
            scoring: Scoring::Direct(RwLock::new(HybridScorer::new(Some(weights))?)),
        })
    }

    pub fn from_config(config: &ResolutionConfig) -> ResolutionResult<Self> {
        if config.cache_enabled {
            Self::new(config.weights, config.cache_size)
        } else {
            info!("Similarity cache disabled by configuration");
            Self::uncached(&config.weights)
        }
    }

    fn read_scorer(lock: &RwLock<HybridScorer>) -> HybridScorer {
        *lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_weights(&self, weights: Option<&SimilarityWeights>) -> ResolutionResult<SimilarityWeights> {
        match weights {
            Some(w) => HybridScorer::new(Some(w)).map(|scorer| *scorer.weights()),
            None => Ok(self.current_weights()),
        }
    }

    /// Hybrid score of one pair with a per-metric breakdown. Supplied weights
    /// apply to this call only.
    pub fn score(
        &self,
        s1: &str,
        s2: &str,
        weights: Option<&SimilarityWeights>,
    ) -> ResolutionResult<SimilarityResult> {
        validate_pair(s1, s2)?;
        let weights = self.resolve_weights(weights)?;

        let similarity = match &self.scoring {
            Scoring::Cached(cache) => cache.similarity_with(s1, s2, &weights),
            Scoring::Direct(_) => hybrid_similarity(s1, s2, &weights),
        };

        Ok(SimilarityResult {
            string1: s1.to_string(),
            string2: s2.to_string(),
            similarity,
            breakdown: Some(similarity_breakdown(s1, s2, &weights)),
        })
    }

    /// Hybrid score under the current weights, without the breakdown.
    pub fn similarity(&self, s1: &str, s2: &str) -> ResolutionResult<f64> {
        match &self.scoring {
            Scoring::Cached(cache) => {
                validate_pair(s1, s2)?;
                Ok(cache.similarity(s1, s2))
            }
            Scoring::Direct(lock) => Self::read_scorer(lock).score(s1, s2),
        }
    }

    /// Scores up to `MAX_BATCH_PAIRS` pairs. Blank pairs are reported per item
    /// instead of failing the batch.
    pub fn batch_score(
        &self,
        pairs: &[SimilarityPair],
        weights: Option<&SimilarityWeights>,
    ) -> ResolutionResult<BatchScoreResult> {
        validate_batch_len(pairs.len())?;
        let weights = self.resolve_weights(weights)?;

        let (valid, rejected): (Vec<(usize, &SimilarityPair)>, Vec<(usize, &SimilarityPair)>) =
            pairs
                .iter()
                .enumerate()
                .partition(|(_, pair)| validate_pair(&pair.s1, &pair.s2).is_ok());

        let valid_pairs: Vec<SimilarityPair> = valid.iter().map(|(_, p)| (*p).clone()).collect();

        // an uncached service still dedupes within the batch
        let scratch;
        let cache = match &self.scoring {
            Scoring::Cached(cache) => cache,
            Scoring::Direct(_) => {
                scratch = SimilarityCache::new(weights, DEFAULT_CACHE_SIZE)?;
                &scratch
            }
        };
        let scores = cache.batch_similarity(&valid_pairs, Some(&weights));
        let cache_size = cache.len();

        let mut items: Vec<Option<BatchScoreItem>> = vec![None; pairs.len()];
        for ((index, pair), score) in valid.iter().zip(scores) {
            items[*index] = Some(BatchScoreItem {
                string1: pair.s1.clone(),
                string2: pair.s2.clone(),
                similarity: Some(score),
                error: None,
            });
        }
        for (index, pair) in &rejected {
            let message = validate_pair(&pair.s1, &pair.s2)
                .err()
                .map(|e| e.to_string())
                .unwrap_or_default();
            items[*index] = Some(BatchScoreItem {
                string1: pair.s1.clone(),
                string2: pair.s2.clone(),
                similarity: None,
                error: Some(message),
            });
        }

        debug!(
            "Batch scored: {} ok, {} rejected, cache size {}",
            valid.len(),
            rejected.len(),
            cache_size
        );

        Ok(BatchScoreResult {
            items: items.into_iter().flatten().collect(),
            scored_count: valid.len(),
            rejected_count: rejected.len(),
            cache_size,
        })
    }

    /// Validates, normalizes and stores new weights for subsequent calls.
    pub fn set_weights(&self, weights: Option<&SimilarityWeights>) -> ResolutionResult<SimilarityWeights> {
        let weights =
            weights.ok_or_else(|| ResolutionError::validation("weights are required"))?;
        match &self.scoring {
            Scoring::Cached(cache) => cache.set_weights(weights),
            Scoring::Direct(lock) => {
                let scorer = HybridScorer::new(Some(weights))?;
                *lock.write().unwrap_or_else(PoisonError::into_inner) = scorer;
                info!("Similarity weights updated: {:?}", scorer.weights().as_array());
                Ok(*scorer.weights())
            }
        }
    }

    pub fn default_weights(&self) -> SimilarityWeights {
        SimilarityWeights::default()
    }

    pub fn current_weights(&self) -> SimilarityWeights {
        match &self.scoring {
            Scoring::Cached(cache) => cache.weights(),
            Scoring::Direct(lock) => *Self::read_scorer(lock).weights(),
        }
    }

    /// Empties the cache, returning how many entries were dropped.
    pub fn clear_cache(&self) -> usize {
        match &self.scoring {
            Scoring::Cached(cache) => cache.clear(),
            Scoring::Direct(_) => 0,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        match &self.scoring {
            Scoring::Cached(cache) => CacheStats {
                size: cache.len(),
                capacity: cache.capacity(),
                enabled: true,
            },
            Scoring::Direct(_) => CacheStats {
                size: 0,
                capacity: 0,
                enabled: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::hybrid::MAX_BATCH_PAIRS;
    use std::sync::Arc;

    fn service() -> SimilarityService {
        SimilarityService::new(SimilarityWeights::default(), 100).unwrap()
    }

    #[test]
    fn test_score_includes_breakdown() {
        let result = service().score("ACME Corp", "Acme Corporation", None).unwrap();
        assert!(result.similarity > 0.5);
        let breakdown = result.breakdown.unwrap();
        assert_eq!(breakdown.weights, SimilarityWeights::default());
        assert_eq!(result.string1, "ACME Corp");
    }

    #[test]
    fn test_score_rejects_blank_and_bad_weights() {
        let svc = service();
        assert!(svc.score(" ", "x", None).unwrap_err().is_validation());
        let bad = SimilarityWeights::from_array([0.0; 5]);
        assert!(svc.score("a", "b", Some(&bad)).unwrap_err().is_validation());
    }

    #[test]
    fn test_cached_and_uncached_agree() {
        let cached = service();
        let uncached = SimilarityService::disabled();
        for (a, b) in [("ACME Corp", "Acme Corporation"), ("ООО Ромашка", "Ромашка ООО")] {
            let first = cached.score(a, b, None).unwrap().similarity;
            let second = cached.score(a, b, None).unwrap().similarity;
            let direct = uncached.score(a, b, None).unwrap().similarity;
            assert_eq!(first, second);
            assert_eq!(first, direct);
        }
    }

    #[test]
    fn test_batch_limits() {
        let svc = service();
        assert!(svc.batch_score(&[], None).unwrap_err().is_validation());

        let too_many = vec![SimilarityPair::new("a", "b"); MAX_BATCH_PAIRS + 1];
        assert!(svc.batch_score(&too_many, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_batch_reports_blank_pairs_in_place() {
        let svc = service();
        let pairs = vec![
            SimilarityPair::new("ACME Corp", "Acme Corporation"),
            SimilarityPair::new("", "Acme"),
            SimilarityPair::new("Acme", "Acme"),
        ];
        let result = svc.batch_score(&pairs, None).unwrap();
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.scored_count, 2);
        assert_eq!(result.rejected_count, 1);
        assert!(result.items[1].similarity.is_none());
        assert!(result.items[1].error.is_some());
        assert_eq!(result.items[2].similarity, Some(1.0));
        assert_eq!(result.cache_size, 2);
    }

    #[test]
    fn test_set_weights_normalizes_and_persists() {
        let svc = service();
        assert!(svc.set_weights(None).unwrap_err().is_validation());

        let stored = svc
            .set_weights(Some(&SimilarityWeights::from_array([2.0, 2.0, 0.0, 0.0, 0.0])))
            .unwrap();
        assert_eq!(stored.jaro_winkler, 0.5);
        assert_eq!(svc.current_weights(), stored);
        assert_eq!(svc.default_weights(), SimilarityWeights::default());

        let uncached = SimilarityService::disabled();
        uncached.set_weights(Some(&stored)).unwrap();
        assert_eq!(uncached.current_weights(), stored);
    }

    #[test]
    fn test_default_service_uses_default_weights() {
        assert_eq!(service().current_weights(), service().default_weights());
        let disabled = SimilarityService::disabled();
        assert_eq!(disabled.current_weights(), SimilarityWeights::default());
    }

    #[test]
    fn test_uncached_batch_reports_scratch_size() {
        let svc = SimilarityService::disabled();
        let pairs = vec![
            SimilarityPair::new("ACME Corp", "Acme Corporation"),
            SimilarityPair::new("Acme Corporation", "ACME Corp"),
            SimilarityPair::new("Global Trade", "Global Trading"),
        ];
        let result = svc.batch_score(&pairs, None).unwrap();
        assert_eq!(result.scored_count, 3);
        assert_eq!(result.cache_size, 2);
        assert_eq!(svc.cache_stats().size, 0);
    }

    #[test]
    fn test_weights_change_through_shared_service() {
        for svc in [service(), SimilarityService::disabled()] {
            let svc = Arc::new(svc);
            let before = svc.similarity("martha", "marhta").unwrap();
            let jw_only = SimilarityWeights::from_array([1.0, 0.0, 0.0, 0.0, 0.0]);

            let writer = Arc::clone(&svc);
            std::thread::spawn(move || writer.set_weights(Some(&jw_only)).unwrap())
                .join()
                .unwrap();

            assert_eq!(svc.current_weights(), jw_only);
            let after = svc.similarity("martha", "marhta").unwrap();
            assert_ne!(before, after);
            assert_eq!(after, hybrid_similarity("martha", "marhta", &jw_only));
        }
    }

    #[test]
    fn test_cache_stats_and_clear() {
        let svc = service();
        svc.score("a", "b", None).unwrap();
        assert_eq!(
            svc.cache_stats(),
            CacheStats {
                size: 1,
                capacity: 100,
                enabled: true
            }
        );
        assert_eq!(svc.clear_cache(), 1);

        let disabled = SimilarityService::disabled();
        assert!(!disabled.cache_stats().enabled);
        assert_eq!(disabled.clear_cache(), 0);
    }

    #[test]
    fn test_from_config_respects_disabled_cache() {
        let config = ResolutionConfig {
            cache_enabled: false,
            ..ResolutionConfig::default()
        };
        let svc = SimilarityService::from_config(&config).unwrap();
        assert!(!svc.cache_stats().enabled);
    }
}
