// src/models/merge.rs
use serde::{Deserialize, Serialize};

use super::core::{CounterpartyRecord, RecordId};

/// Records sharing one grouping tax identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub members: Vec<CounterpartyRecord>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> Vec<RecordId> {
        self.members.iter().map(|m| m.id).collect()
    }
}

/// A per-item failure inside a best-effort operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: RecordId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Master state as re-read from the store after the merge.
    pub master: CounterpartyRecord,
    pub absorbed_count: usize,
    pub deleted_count: usize,
    pub links_migrated: usize,
    /// Absorb ids that could not be loaded and were left untouched.
    pub skipped_ids: Vec<RecordId>,
    /// Link-migration and deletion failures. The merge itself still succeeded.
    pub failures: Vec<ItemFailure>,
}

impl MergeOutcome {
    pub fn unchanged(master: CounterpartyRecord) -> Self {
        Self {
            master,
            absorbed_count: 0,
            deleted_count: 0,
            links_migrated: 0,
            skipped_ids: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Summary of a continue-on-error bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub failures: Vec<ItemFailure>,
}

impl BulkOutcome {
    pub fn record_success(&mut self) {
        self.total += 1;
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, id: RecordId, message: impl Into<String>) {
        self.total += 1;
        self.failed_count += 1;
        self.failures.push(ItemFailure {
            id,
            message: message.into(),
        });
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_count == 0
    }

    /// True when nothing succeeded although there was work to do.
    pub fn is_total_failure(&self) -> bool {
        self.total > 0 && self.success_count == 0
    }
}
