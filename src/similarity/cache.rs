// src/similarity/cache.rs
use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{ResolutionError, ResolutionResult};
use crate::models::similarity::{SimilarityPair, SimilarityWeights};

use super::hybrid::hybrid_similarity;
use super::metrics::normalize_text;
use super::weights::{validate_weights, WeightSignature};

/// Default number of cached scores.
pub const DEFAULT_CACHE_SIZE: usize = 10000;

// Log hit statistics every this many hits
const STATS_LOG_INTERVAL: usize = 1000;

/// Cache key: the normalized pair in canonical order plus the signature of the
/// weights the score was computed with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    first: String,
    second: String,
    signature: WeightSignature,
}

impl CacheKey {
    pub fn new(s1: &str, s2: &str, signature: WeightSignature) -> Self {
        let (a, b) = (normalize_text(s1), normalize_text(s2));
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first,
            second,
            signature,
        }
    }
}

struct CacheState {
    entries: LruCache<CacheKey, f64>,
    weights: SimilarityWeights,
}

/// Bounded memo of hybrid scores, safe to share between threads.
///
/// Entries computed under one weight vector are never returned for another:
/// after `set_weights` the old entries simply stop matching and age out.
pub struct SimilarityCache {
    state: RwLock<CacheState>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SimilarityCache {
    pub fn new(weights: SimilarityWeights, capacity: usize) -> ResolutionResult<Self> {
        let weights = validate_weights(&weights)?;
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| ResolutionError::validation("cache capacity must be positive"))?;

        info!(
            "Initializing SimilarityCache with capacity: {}",
            capacity.get()
        );

        Ok(Self {
            state: RwLock::new(CacheState {
                entries: LruCache::new(capacity),
                weights,
            }),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        })
    }

    pub fn with_default_weights(capacity: usize) -> ResolutionResult<Self> {
        Self::new(SimilarityWeights::default(), capacity)
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_hit(&self) {
        let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        if hits % STATS_LOG_INTERVAL == 0 {
            let misses = self.misses.load(Ordering::Relaxed);
            info!(
                "SimilarityCache stats - hits: {}, misses: {}, hit rate: {:.2}%",
                hits,
                misses,
                (hits as f64 / (hits + misses) as f64) * 100.0
            );
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Hybrid score under the stored weights.
    pub fn similarity(&self, s1: &str, s2: &str) -> f64 {
        let weights = self.weights();
        self.similarity_with(s1, s2, &weights)
    }

    /// Hybrid score under `weights`, which must already be validated. The
    /// stored weights are left alone.
    pub fn similarity_with(&self, s1: &str, s2: &str, weights: &SimilarityWeights) -> f64 {
        let key = CacheKey::new(s1, s2, weights.signature());

        if let Some(&score) = self.read().entries.peek(&key) {
            self.record_hit();
            return score;
        }

        self.record_miss();
        let score = hybrid_similarity(s1, s2, weights);
        self.write().entries.put(key, score);
        score
    }

    /// Scores every pair under one exclusive lock, in input order. `None`
    /// uses the stored weights.
    pub fn batch_similarity(
        &self,
        pairs: &[SimilarityPair],
        weights: Option<&SimilarityWeights>,
    ) -> Vec<f64> {
        let mut state = self.write();
        let weights = weights.copied().unwrap_or(state.weights);
        let signature = weights.signature();

        let scores = pairs
            .iter()
            .map(|pair| {
                let key = CacheKey::new(&pair.s1, &pair.s2, signature.clone());
                if let Some(&score) = state.entries.get(&key) {
                    self.record_hit();
                    return score;
                }
                self.record_miss();
                let score = hybrid_similarity(&pair.s1, &pair.s2, &weights);
                state.entries.put(key, score);
                score
            })
            .collect();

        debug!(
            "Batch of {} pairs scored, cache now holds {} entries",
            pairs.len(),
            state.entries.len()
        );
        scores
    }

    /// Validates, normalizes and stores new weights.
    pub fn set_weights(&self, weights: &SimilarityWeights) -> ResolutionResult<SimilarityWeights> {
        let weights = validate_weights(weights)?;
        self.write().weights = weights;
        info!("Similarity weights updated: {:?}", weights.as_array());
        Ok(weights)
    }

    pub fn weights(&self) -> SimilarityWeights {
        self.read().weights
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.read().entries.cap().get()
    }

    /// Drops every entry and resets the statistics. Returns the number of
    /// entries removed.
    pub fn clear(&self) -> usize {
        let mut state = self.write();
        let evicted = state.entries.len();
        state.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        info!("Similarity cache cleared ({} entries)", evicted);
        evicted
    }

    /// (hits, misses) since construction or the last clear.
    pub fn get_stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    const NAMES: &[&str] = &[
        "ACME Corp",
        "Acme Corporation",
        "ООО Ромашка",
        "Ромашка",
        "Totally Different Inc",
        "Global Trade House",
        "Global Trading",
    ];

    #[test]
    fn test_cached_scores_match_direct_scores() {
        let cache = SimilarityCache::with_default_weights(64).unwrap();
        let weights = SimilarityWeights::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = NAMES[rng.gen_range(0..NAMES.len())];
            let b = NAMES[rng.gen_range(0..NAMES.len())];
            assert_eq!(cache.similarity(a, b), hybrid_similarity(a, b, &weights));
        }
        let (hits, misses) = cache.get_stats();
        assert!(hits > 0);
        assert!(misses <= NAMES.len() * NAMES.len());
    }

    #[test]
    fn test_pair_order_shares_an_entry() {
        let cache = SimilarityCache::with_default_weights(8).unwrap();
        let forward = cache.similarity("ACME Corp", "Acme Corporation");
        let backward = cache.similarity("acme corporation", "  acme   corp");
        assert_eq!(forward, backward);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_stats(), (1, 1));
    }

    #[test]
    fn test_weight_change_never_returns_stale_scores() {
        let cache = SimilarityCache::with_default_weights(8).unwrap();
        let before = cache.similarity("martha", "marhta");

        let jw_only = SimilarityWeights::from_array([1.0, 0.0, 0.0, 0.0, 0.0]);
        cache.set_weights(&jw_only).unwrap();
        let after = cache.similarity("martha", "marhta");

        assert_ne!(before, after);
        assert_eq!(after, hybrid_similarity("martha", "marhta", &jw_only));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_per_call_weights_leave_stored_weights_alone() {
        let cache = SimilarityCache::with_default_weights(8).unwrap();
        let custom = SimilarityWeights::from_array([0.0, 1.0, 0.0, 0.0, 0.0]);
        cache.similarity_with("abc", "abd", &custom);
        assert_eq!(cache.weights(), SimilarityWeights::default());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = SimilarityCache::with_default_weights(3).unwrap();
        for i in 0..10 {
            cache.similarity(&format!("name {}", i), "name");
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.capacity(), 3);
        assert!(SimilarityCache::with_default_weights(0).is_err());
    }

    #[test]
    fn test_batch_preserves_order() {
        let cache = SimilarityCache::with_default_weights(16).unwrap();
        let pairs: Vec<SimilarityPair> = NAMES
            .windows(2)
            .map(|w| SimilarityPair::new(w[0], w[1]))
            .collect();
        let scores = cache.batch_similarity(&pairs, None);
        assert_eq!(scores.len(), pairs.len());
        for (pair, score) in pairs.iter().zip(&scores) {
            assert_eq!(*score, cache.similarity(&pair.s1, &pair.s2));
        }
    }

    #[test]
    fn test_clear_reports_evicted_entries() {
        let cache = SimilarityCache::with_default_weights(8).unwrap();
        cache.similarity("a", "b");
        cache.similarity("a", "c");
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.get_stats(), (0, 0));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(SimilarityCache::with_default_weights(32).unwrap());
        let expected = hybrid_similarity("ACME Corp", "Acme Corporation", &SimilarityWeights::default());

        std::thread::scope(|scope| {
            for t in 0..4 {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for i in 0..50 {
                        assert_eq!(cache.similarity("ACME Corp", "Acme Corporation"), expected);
                        cache.similarity(&format!("worker {} item {}", t, i), "worker");
                    }
                });
            }
        });
        assert!(cache.len() <= 32);
    }
}
