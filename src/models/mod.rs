// src/models/mod.rs
pub mod core;
pub mod merge;
pub mod similarity;

pub use self::core::{
    CounterpartyRecord, DatabaseLink, RecordFilter, RecordId, RecordPage, RecordPatch,
};
pub use self::merge::{BulkOutcome, DuplicateGroup, ItemFailure, MergeOutcome};
pub use self::similarity::{
    BatchScoreItem, BatchScoreResult, CacheStats, SimilarityBreakdown, SimilarityPair,
    SimilarityResult, SimilarityWeights,
};
