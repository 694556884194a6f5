// src/consolidation/bulk.rs - Continue-on-error bulk update and delete
use log::debug;

use crate::errors::{ResolutionError, ResolutionResult};
use crate::models::core::{RecordId, RecordPatch};
use crate::models::merge::BulkOutcome;
use crate::store::RecordStore;
use crate::utils::logging::{ResolutionLogger, ResolutionOperation};

fn require_ids(ids: &[RecordId]) -> ResolutionResult<()> {
    if ids.is_empty() {
        return Err(ResolutionError::validation("ids must not be empty"));
    }
    Ok(())
}

/// Deletes each id in turn, recording every failure instead of stopping.
pub(crate) async fn delete_each<S: RecordStore>(store: &S, ids: &[RecordId]) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for &id in ids {
        match store.delete_record(id).await {
            Ok(()) => outcome.record_success(),
            Err(e) => {
                debug!("Delete of counterparty {} failed: {:#}", id, e);
                outcome.record_failure(id, format!("Counterparty {}: {:#}", id, e));
            }
        }
    }
    outcome
}

/// Applies `patch` to every record in `ids`. A record that cannot be loaded
/// or written is reported and the rest continue.
pub async fn bulk_update<S: RecordStore>(
    store: &S,
    ids: &[RecordId],
    patch: &RecordPatch,
) -> ResolutionResult<BulkOutcome> {
    require_ids(ids)?;
    if patch.is_empty() {
        return Err(ResolutionError::validation("no fields to update"));
    }

    let logger = ResolutionLogger::new(ResolutionOperation::BulkUpdate);
    logger.log_start(&format!("update of {} records", ids.len()));

    let mut outcome = BulkOutcome::default();
    for (done, &id) in ids.iter().enumerate() {
        let mut record = match store.get_record(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                outcome.record_failure(id, format!("Counterparty {}: not found", id));
                continue;
            }
            Err(e) => {
                outcome.record_failure(id, format!("Counterparty {}: {:#}", id, e));
                continue;
            }
        };
        patch.apply_to(&mut record);
        match store.update_record(&record).await {
            Ok(()) => outcome.record_success(),
            Err(e) => outcome.record_failure(id, format!("Counterparty {}: {:#}", id, e)),
        }
        logger.log_progress_update(done + 1, ids.len());
    }

    logger.log_bulk_summary(outcome.total, outcome.success_count, outcome.failed_count);
    Ok(outcome)
}

/// Deletes every record in `ids`, continuing past failures.
pub async fn bulk_delete<S: RecordStore>(
    store: &S,
    ids: &[RecordId],
) -> ResolutionResult<BulkOutcome> {
    require_ids(ids)?;
    let logger = ResolutionLogger::new(ResolutionOperation::BulkDelete);
    logger.log_start(&format!("delete of {} records", ids.len()));

    let outcome = delete_each(store, ids).await;
    logger.log_bulk_summary(outcome.total, outcome.success_count, outcome.failed_count);
    Ok(outcome)
}
