// src/similarity/mod.rs
pub mod cache;
pub mod evaluation;
pub mod hybrid;
pub mod matcher;
pub mod metrics;
pub mod phonetic;
pub mod service;
pub mod weights;

pub use cache::SimilarityCache;
pub use hybrid::{hybrid_similarity, HybridScorer, MAX_BATCH_PAIRS};
pub use matcher::{best_match, strip_legal_forms, NameMatch};
pub use service::SimilarityService;
pub use weights::validate_weights;
