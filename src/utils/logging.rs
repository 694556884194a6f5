// src/utils/logging.rs - Tagged logging for resolution operations
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOperation {
    Grouping,
    Merge,
    Resolve,
    DeleteGroup,
    BulkUpdate,
    BulkDelete,
}

impl ResolutionOperation {
    fn tag(self) -> (&'static str, &'static str) {
        match self {
            ResolutionOperation::Grouping => ("GROUPING", "🧩"),
            ResolutionOperation::Merge => ("MERGE", "🔗"),
            ResolutionOperation::Resolve => ("RESOLVE", "🎯"),
            ResolutionOperation::DeleteGroup => ("DELETE_GROUP", "🗑️"),
            ResolutionOperation::BulkUpdate => ("BULK_UPDATE", "✏️"),
            ResolutionOperation::BulkDelete => ("BULK_DELETE", "🧹"),
        }
    }
}

#[derive(Clone)]
pub struct ResolutionLogger {
    name: &'static str,
    emoji: &'static str,
    start_time: Instant,
}

impl ResolutionLogger {
    pub fn new(operation: ResolutionOperation) -> Self {
        let (name, emoji) = operation.tag();
        Self {
            name,
            emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, target: &str) {
        info!("[{}] {} 🚀 Starting {}", self.name, self.emoji, target);
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.name,
                self.emoji,
                phase,
                details,
                elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.name,
                self.emoji,
                phase,
                elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Loaded {} {} from the record store",
            self.name, self.emoji, count, data_type
        );
    }

    pub fn log_grouping_complete(&self, records: usize, keyed: usize, groups: usize) {
        info!(
            "[{}] {} ✅ Grouping complete: {} records → {} with a grouping key → {} duplicate groups",
            self.name, self.emoji, records, keyed, groups
        );
    }

    pub fn log_merge_summary(
        &self,
        master_id: i64,
        absorbed: usize,
        deleted: usize,
        links_migrated: usize,
        failures: usize,
    ) {
        info!(
            "[{}] {} 🎉 Master {}: absorbed {}, deleted {}, {} links migrated in {:.2?}",
            self.name,
            self.emoji,
            master_id,
            absorbed,
            deleted,
            links_migrated,
            self.start_time.elapsed()
        );
        if failures > 0 {
            warn!(
                "[{}] {} ⚠️  {} non-fatal failures during merge",
                self.name, self.emoji, failures
            );
        }
    }

    pub fn log_bulk_summary(&self, total: usize, succeeded: usize, failed: usize) {
        info!(
            "[{}] {} 🎉 COMPLETED: {}/{} succeeded, {} failed in {:.2?}",
            self.name,
            self.emoji,
            succeeded,
            total,
            failed,
            self.start_time.elapsed()
        );
    }

    pub fn log_progress_update(&self, current: usize, total: usize) {
        let should_log =
            current == total || (total >= 100 && current % (total / 10) == 0);
        if should_log && current > 0 {
            let percent = (current as f64 / total as f64) * 100.0;
            info!(
                "[{}] {} 📊 Progress: {}/{} ({:.1}%)",
                self.name, self.emoji, current, total, percent
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.name, self.emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.name, self.emoji, message);
    }
}
