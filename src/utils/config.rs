//! Runtime configuration for the resolution core, read from environment
//! variables (a `.env` file is loaded first by `utils::env::load_env`).

use log::{info, warn};
use std::env;

use crate::models::similarity::SimilarityWeights;
use crate::similarity::cache::DEFAULT_CACHE_SIZE;
use crate::similarity::weights::validate_weights;

pub const DEFAULT_RECORD_PAGE_SIZE: usize = 10000;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionConfig {
    pub cache_enabled: bool,
    pub cache_size: usize,
    pub weights: SimilarityWeights,
    pub record_page_size: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_size: DEFAULT_CACHE_SIZE,
            weights: SimilarityWeights::default(),
            record_page_size: DEFAULT_RECORD_PAGE_SIZE,
        }
    }
}

impl ResolutionConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unparseable values fall
    /// back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache_enabled = lookup("SIMILARITY_CACHE_ENABLED")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.cache_enabled);

        let cache_size = positive_usize(&lookup, "SIMILARITY_CACHE_SIZE", defaults.cache_size);
        let record_page_size =
            positive_usize(&lookup, "RECORD_PAGE_SIZE", defaults.record_page_size);

        let weights = match lookup("SIMILARITY_WEIGHTS") {
            Some(raw) if !raw.trim().is_empty() => {
                match SimilarityWeights::parse_list(&raw).and_then(|w| validate_weights(&w)) {
                    Ok(weights) => weights,
                    Err(e) => {
                        warn!("Ignoring SIMILARITY_WEIGHTS='{}': {}. Using defaults.", raw, e);
                        defaults.weights
                    }
                }
            }
            _ => defaults.weights,
        };

        Self {
            cache_enabled,
            cache_size,
            weights,
            record_page_size,
        }
    }

    pub fn log_config(&self) {
        if self.cache_enabled {
            info!("🗃️ Similarity cache ENABLED (capacity {})", self.cache_size);
        } else {
            info!("🗃️ Similarity cache DISABLED - every pair is scored directly");
        }
        info!(
            "   Weights: jaro_winkler={:.3}, lcs={:.3}, phonetic={:.3}, ngram={:.3}, jaccard={:.3}",
            self.weights.jaro_winkler,
            self.weights.lcs,
            self.weights.phonetic,
            self.weights.ngram,
            self.weights.jaccard
        );
        info!("   Record page size: {}", self.record_page_size);
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn positive_usize<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().parse::<usize>()) {
        Some(Ok(value)) if value > 0 => value,
        Some(_) => {
            warn!("{} must be a positive integer, using {}", key, default);
            default
        }
        None => default,
    }
}
