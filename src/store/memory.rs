// src/store/memory.rs - RecordStore held in process memory
use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::core::{CounterpartyRecord, DatabaseLink, RecordFilter, RecordId, RecordPage};

use super::RecordStore;

/// Store operations that can be made to fail for a given record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Get,
    Update,
    Delete,
    ReadLinks,
    SaveLink,
}

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<RecordId, CounterpartyRecord>,
    links: Vec<DatabaseLink>,
    failures: HashSet<(FailPoint, RecordId)>,
}

/// Records and links kept in ordered maps. Deleting a record drops its links.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<MemoryState>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CounterpartyRecord>,
    {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: CounterpartyRecord) {
        self.lock().records.insert(record.id, record);
    }

    pub fn insert_link(&self, link: DatabaseLink) {
        let mut state = self.lock();
        if !state.links.contains(&link) {
            state.links.push(link);
        }
    }

    /// Makes `point` fail for `id` from now on.
    pub fn fail_on(&self, point: FailPoint, id: RecordId) {
        self.lock().failures.insert((point, id));
    }

    pub fn records(&self) -> Vec<CounterpartyRecord> {
        self.lock().records.values().cloned().collect()
    }

    pub fn links(&self) -> Vec<DatabaseLink> {
        self.lock().links.clone()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.lock().records.contains_key(&id)
    }

    fn check(state: &MemoryState, point: FailPoint, id: RecordId) -> Result<()> {
        if state.failures.contains(&(point, id)) {
            return Err(anyhow!("injected {:?} failure for record {}", point, id));
        }
        Ok(())
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn get_record(&self, id: RecordId) -> Result<Option<CounterpartyRecord>> {
        let state = self.lock();
        Self::check(&state, FailPoint::Get, id)?;
        Ok(state.records.get(&id).cloned())
    }

    async fn update_record(&self, record: &CounterpartyRecord) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, FailPoint::Update, record.id)?;
        match state.records.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => bail!("record {} does not exist", record.id),
        }
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, FailPoint::Delete, id)?;
        if state.records.remove(&id).is_none() {
            bail!("record {} does not exist", id);
        }
        state.links.retain(|link| link.record_id != id);
        Ok(())
    }

    async fn list_records(
        &self,
        scope_id: i64,
        offset: usize,
        limit: usize,
        filter: &RecordFilter,
    ) -> Result<RecordPage> {
        let state = self.lock();
        let matching: Vec<&CounterpartyRecord> = state
            .records
            .values()
            .filter(|r| r.project_id == scope_id && filter.matches(r))
            .collect();
        Ok(RecordPage {
            total: matching.len(),
            records: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    async fn get_record_database_links(&self, id: RecordId) -> Result<Vec<DatabaseLink>> {
        let state = self.lock();
        Self::check(&state, FailPoint::ReadLinks, id)?;
        Ok(state
            .links
            .iter()
            .filter(|link| link.record_id == id)
            .cloned()
            .collect())
    }

    async fn save_record_database_link(&self, link: &DatabaseLink) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, FailPoint::SaveLink, link.record_id)?;
        if !state.records.contains_key(&link.record_id) {
            bail!("cannot link missing record {}", link.record_id);
        }
        let exists = state.links.iter().any(|l| {
            l.record_id == link.record_id
                && l.database_id == link.database_id
                && l.source_reference == link.source_reference
        });
        if !exists {
            state.links.push(link.clone());
        }
        Ok(())
    }
}
