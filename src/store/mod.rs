//! The record store the resolution core reads from and writes back to.
//!
//! The core never owns persistence. Everything it needs from the store is
//! captured by [`RecordStore`]; `memory` backs tests and offline runs,
//! `postgres` backs the CLI.

pub mod memory;
pub mod postgres;

use anyhow::Result;

use crate::models::core::{CounterpartyRecord, DatabaseLink, RecordFilter, RecordId, RecordPage};

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// `Ok(None)` when no record has this id.
    async fn get_record(&self, id: RecordId) -> Result<Option<CounterpartyRecord>>;

    /// Overwrites every field of the stored record with `record.id`.
    async fn update_record(&self, record: &CounterpartyRecord) -> Result<()>;

    async fn delete_record(&self, id: RecordId) -> Result<()>;

    /// One page of a project's records, ordered by id.
    async fn list_records(
        &self,
        scope_id: i64,
        offset: usize,
        limit: usize,
        filter: &RecordFilter,
    ) -> Result<RecordPage>;

    async fn get_record_database_links(&self, id: RecordId) -> Result<Vec<DatabaseLink>>;

    /// Saving a link that already exists is a no-op.
    async fn save_record_database_link(&self, link: &DatabaseLink) -> Result<()>;
}
