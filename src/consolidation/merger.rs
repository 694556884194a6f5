// src/consolidation/merger.rs - Folding duplicate records into a master record
use anyhow::Context;
use log::{debug, info, warn};
use std::collections::HashSet;

use crate::clustering::duplicate_groups::{group_duplicates, records_for_key};
use crate::errors::{ResolutionError, ResolutionResult};
use crate::models::core::{CounterpartyRecord, DatabaseLink, RecordFilter, RecordId};
use crate::models::merge::{BulkOutcome, DuplicateGroup, ItemFailure, MergeOutcome};
use crate::store::RecordStore;
use crate::utils::config::{ResolutionConfig, DEFAULT_RECORD_PAGE_SIZE};
use crate::utils::logging::{ResolutionLogger, ResolutionOperation};

use super::bulk::delete_each;
use super::field_merge::merge_fields;

/// Picks the record with the highest quality score; the earliest wins ties.
pub fn select_master(records: &[CounterpartyRecord]) -> Option<&CounterpartyRecord> {
    records.iter().fold(None, |best, record| match best {
        Some(b) if record.quality_score <= b.quality_score => Some(b),
        _ => Some(record),
    })
}

/// Runs merges, group resolution and group deletion against a record store.
///
/// Merges are sequential store calls without any locking of their own:
/// callers must not run overlapping merges concurrently.
pub struct RecordMerger<'a, S: RecordStore> {
    store: &'a S,
    page_size: usize,
}

impl<'a, S: RecordStore> RecordMerger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            page_size: DEFAULT_RECORD_PAGE_SIZE,
        }
    }

    pub fn from_config(store: &'a S, config: &ResolutionConfig) -> Self {
        Self {
            store,
            page_size: config.record_page_size.max(1),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every record of a project, read page by page.
    pub async fn load_scope(&self, scope_id: i64) -> ResolutionResult<Vec<CounterpartyRecord>> {
        let filter = RecordFilter::default();
        let mut records = Vec::new();
        loop {
            let page = self
                .store
                .list_records(scope_id, records.len(), self.page_size, &filter)
                .await
                .with_context(|| {
                    format!(
                        "Failed to list records of project {} at offset {}",
                        scope_id,
                        records.len()
                    )
                })?;
            let fetched = page.records.len();
            records.extend(page.records);
            if fetched == 0 || records.len() >= page.total {
                break;
            }
        }
        Ok(records)
    }

    /// Duplicate groups of one project.
    pub async fn find_duplicate_groups(
        &self,
        scope_id: i64,
    ) -> ResolutionResult<Vec<DuplicateGroup>> {
        let records = self.load_scope(scope_id).await?;
        Ok(group_duplicates(&records))
    }

    /// Folds every record of `absorb_ids` into `master_id`, migrates their
    /// database links and deletes them.
    ///
    /// Only a missing master or a failed master update abort the merge.
    /// Absorb records that cannot be loaded are skipped and left untouched;
    /// link and delete failures are collected in the outcome.
    pub async fn merge(
        &self,
        master_id: RecordId,
        absorb_ids: &[RecordId],
    ) -> ResolutionResult<MergeOutcome> {
        let logger = ResolutionLogger::new(ResolutionOperation::Merge);
        logger.log_start(&format!("merge into master {}", master_id));

        let mut master = self
            .store
            .get_record(master_id)
            .await
            .with_context(|| format!("Failed to load master record {}", master_id))?
            .ok_or_else(|| {
                ResolutionError::not_found(format!("master record {}", master_id))
            })?;

        let mut seen = HashSet::new();
        let absorb_ids: Vec<RecordId> = absorb_ids
            .iter()
            .copied()
            .filter(|&id| id != master_id && seen.insert(id))
            .collect();
        if absorb_ids.is_empty() {
            logger.log_debug("nothing to absorb");
            return Ok(MergeOutcome::unchanged(master));
        }

        let mut linked_databases: HashSet<i64> =
            match self.store.get_record_database_links(master_id).await {
                Ok(links) => links.into_iter().map(|l| l.database_id).collect(),
                Err(e) => {
                    logger.log_warning(&format!(
                        "could not read links of master {}: {:#}; treating as unlinked",
                        master_id, e
                    ));
                    HashSet::new()
                }
            };

        let mut failures = Vec::new();
        let mut skipped_ids = Vec::new();
        let mut absorbed = Vec::new();
        let mut links_migrated = 0usize;

        for &id in &absorb_ids {
            let duplicate = match self.store.get_record(id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    debug!("Absorb record {} does not exist, skipping", id);
                    skipped_ids.push(id);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to load absorb record {}: {:#}", id, e);
                    skipped_ids.push(id);
                    continue;
                }
            };

            match self.store.get_record_database_links(id).await {
                Ok(links) => {
                    for link in links {
                        if linked_databases.contains(&link.database_id) {
                            continue;
                        }
                        let migrated = DatabaseLink {
                            record_id: master_id,
                            ..link
                        };
                        match self.store.save_record_database_link(&migrated).await {
                            Ok(()) => {
                                linked_databases.insert(migrated.database_id);
                                links_migrated += 1;
                            }
                            Err(e) => failures.push(ItemFailure {
                                id,
                                message: format!(
                                    "link to database {} not migrated: {:#}",
                                    migrated.database_id, e
                                ),
                            }),
                        }
                    }
                }
                Err(e) => failures.push(ItemFailure {
                    id,
                    message: format!("links not readable: {:#}", e),
                }),
            }

            let changed = merge_fields(&mut master, &duplicate);
            debug!("Record {} contributed {} fields to master {}", id, changed, master_id);
            absorbed.push(id);
        }

        self.store
            .update_record(&master)
            .await
            .with_context(|| format!("Failed to update master record {}", master_id))?;

        let deletion = delete_each(self.store, &absorbed).await;
        failures.extend(deletion.failures);

        let master = self
            .store
            .get_record(master_id)
            .await
            .with_context(|| format!("Failed to reload master record {}", master_id))?
            .ok_or_else(|| {
                ResolutionError::not_found(format!("master record {} after merge", master_id))
            })?;

        logger.log_merge_summary(
            master_id,
            absorbed.len(),
            deletion.success_count,
            links_migrated,
            failures.len(),
        );

        Ok(MergeOutcome {
            master,
            absorbed_count: absorbed.len(),
            deleted_count: deletion.success_count,
            links_migrated,
            skipped_ids,
            failures,
        })
    }

    /// Merges the group `key` of a project into its highest-quality record.
    pub async fn resolve_group(&self, scope_id: i64, key: &str) -> ResolutionResult<MergeOutcome> {
        let logger = ResolutionLogger::new(ResolutionOperation::Resolve);
        logger.log_start(&format!("group {} of project {}", key, scope_id));

        let records = self.load_scope(scope_id).await?;
        logger.log_data_loaded(records.len(), "records");

        let members: Vec<CounterpartyRecord> =
            records_for_key(&records, key).into_iter().cloned().collect();
        let master = select_master(&members)
            .cloned()
            .ok_or_else(|| ResolutionError::not_found(format!("duplicate group {}", key)))?;

        if members.len() == 1 {
            info!("Group {} has a single record {}, nothing to merge", key, master.id);
            return Ok(MergeOutcome::unchanged(master));
        }

        let others: Vec<RecordId> = members
            .iter()
            .map(|m| m.id)
            .filter(|&id| id != master.id)
            .collect();
        logger.log_phase(
            "merge",
            Some(&format!("master {} absorbs {:?}", master.id, others)),
        );
        self.merge(master.id, &others).await
    }

    /// Deletes every record of the group `key`. Per-record failures are
    /// reported in the outcome.
    pub async fn delete_duplicate_group(
        &self,
        scope_id: i64,
        key: &str,
    ) -> ResolutionResult<BulkOutcome> {
        let logger = ResolutionLogger::new(ResolutionOperation::DeleteGroup);
        logger.log_start(&format!("group {} of project {}", key, scope_id));

        let records = self.load_scope(scope_id).await?;
        let ids: Vec<RecordId> = records_for_key(&records, key)
            .into_iter()
            .map(|r| r.id)
            .collect();
        if ids.is_empty() {
            return Err(ResolutionError::not_found(format!("duplicate group {}", key)));
        }

        let outcome = delete_each(self.store, &ids).await;
        logger.log_bulk_summary(outcome.total, outcome.success_count, outcome.failed_count);
        Ok(outcome)
    }
}
