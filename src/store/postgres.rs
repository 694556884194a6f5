// src/store/postgres.rs - RecordStore over the normalized_counterparties tables
use anyhow::{bail, Context, Result};
use log::debug;
use tokio_postgres::Row;

use crate::models::core::{CounterpartyRecord, DatabaseLink, RecordFilter, RecordId, RecordPage};
use crate::utils::db_connect::PgPool;

use super::RecordStore;

const RECORD_COLUMNS: &str = "id::bigint AS id,
    client_project_id::bigint AS project_id,
    COALESCE(normalized_name, '') AS name,
    COALESCE(tax_id, '') AS tax_id,
    COALESCE(kpp, '') AS kpp,
    COALESCE(bin, '') AS bin,
    COALESCE(legal_address, '') AS legal_address,
    COALESCE(postal_address, '') AS postal_address,
    COALESCE(contact_phone, '') AS contact_phone,
    COALESCE(contact_email, '') AS contact_email,
    COALESCE(contact_person, '') AS contact_person,
    COALESCE(legal_form, '') AS legal_form,
    COALESCE(bank_name, '') AS bank_name,
    COALESCE(bank_account, '') AS bank_account,
    COALESCE(correspondent_account, '') AS correspondent_account,
    COALESCE(bik, '') AS bik,
    COALESCE(quality_score, 0)::float8 AS quality_score,
    COALESCE(source_enrichment, '') AS source_enrichment,
    COALESCE(subcategory, '') AS subcategory,
    created_at,
    updated_at";

// Shared by the page and count queries. $1 project, $2 search, $3 tax id, $4 BIN.
const LIST_FILTER: &str = "client_project_id = $1::bigint
    AND ($2::text IS NULL OR normalized_name ILIKE '%' || $2::text || '%')
    AND ($3::text IS NULL OR tax_id = $3::text)
    AND ($4::text IS NULL OR bin = $4::text)";

fn row_to_record(row: &Row) -> CounterpartyRecord {
    CounterpartyRecord {
        id: row.get("id"),
        project_id: row.get("project_id"),
        name: row.get("name"),
        tax_id: row.get("tax_id"),
        kpp: row.get("kpp"),
        bin: row.get("bin"),
        legal_address: row.get("legal_address"),
        postal_address: row.get("postal_address"),
        contact_phone: row.get("contact_phone"),
        contact_email: row.get("contact_email"),
        contact_person: row.get("contact_person"),
        legal_form: row.get("legal_form"),
        bank_name: row.get("bank_name"),
        bank_account: row.get("bank_account"),
        correspondent_account: row.get("correspondent_account"),
        bik: row.get("bik"),
        quality_score: row.get("quality_score"),
        source_enrichment: row.get("source_enrichment"),
        subcategory: row.get("subcategory"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Empty filter values mean "no filter".
fn filter_param(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for PgRecordStore {
    async fn get_record(&self, id: RecordId) -> Result<Option<CounterpartyRecord>> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for get_record")?;
        let query = format!(
            "SELECT {} FROM normalized_counterparties WHERE id = $1::bigint",
            RECORD_COLUMNS
        );
        let row = conn
            .query_opt(query.as_str(), &[&id])
            .await
            .context(format!("Failed to load counterparty {}", id))?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn update_record(&self, record: &CounterpartyRecord) -> Result<()> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for update_record")?;
        let updated = conn
            .execute(
                "UPDATE normalized_counterparties
                 SET normalized_name = $2, tax_id = $3, kpp = $4, bin = $5,
                     legal_address = $6, postal_address = $7, contact_phone = $8,
                     contact_email = $9, contact_person = $10, legal_form = $11,
                     bank_name = $12, bank_account = $13, correspondent_account = $14,
                     bik = $15, quality_score = $16::float8, source_enrichment = $17,
                     subcategory = $18, updated_at = CURRENT_TIMESTAMP
                 WHERE id = $1::bigint",
                &[
                    &record.id,
                    &record.name,
                    &record.tax_id,
                    &record.kpp,
                    &record.bin,
                    &record.legal_address,
                    &record.postal_address,
                    &record.contact_phone,
                    &record.contact_email,
                    &record.contact_person,
                    &record.legal_form,
                    &record.bank_name,
                    &record.bank_account,
                    &record.correspondent_account,
                    &record.bik,
                    &record.quality_score,
                    &record.source_enrichment,
                    &record.subcategory,
                ],
            )
            .await
            .context(format!("Failed to update counterparty {}", record.id))?;
        if updated == 0 {
            bail!("counterparty {} does not exist", record.id);
        }
        debug!("Updated counterparty {}", record.id);
        Ok(())
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for delete_record")?;
        let deleted = conn
            .execute(
                "DELETE FROM normalized_counterparties WHERE id = $1::bigint",
                &[&id],
            )
            .await
            .context(format!("Failed to delete counterparty {}", id))?;
        if deleted == 0 {
            bail!("counterparty {} does not exist", id);
        }
        Ok(())
    }

    async fn list_records(
        &self,
        scope_id: i64,
        offset: usize,
        limit: usize,
        filter: &RecordFilter,
    ) -> Result<RecordPage> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for list_records")?;

        let search = filter_param(&filter.search);
        let tax_id = filter_param(&filter.tax_id);
        let bin = filter_param(&filter.bin);
        let limit = i64::try_from(limit).context("page limit out of range")?;
        let offset = i64::try_from(offset).context("page offset out of range")?;

        let count_query = format!(
            "SELECT COUNT(*) AS total FROM normalized_counterparties WHERE {}",
            LIST_FILTER
        );
        let total: i64 = conn
            .query_one(count_query.as_str(), &[&scope_id, &search, &tax_id, &bin])
            .await
            .context(format!("Failed to count counterparties of project {}", scope_id))?
            .get("total");

        let page_query = format!(
            "SELECT {} FROM normalized_counterparties WHERE {} ORDER BY id LIMIT $5 OFFSET $6",
            RECORD_COLUMNS, LIST_FILTER
        );
        let rows = conn
            .query(
                page_query.as_str(),
                &[&scope_id, &search, &tax_id, &bin, &limit, &offset],
            )
            .await
            .context(format!("Failed to list counterparties of project {}", scope_id))?;

        Ok(RecordPage {
            records: rows.iter().map(row_to_record).collect(),
            total: usize::try_from(total).unwrap_or(0),
        })
    }

    async fn get_record_database_links(&self, id: RecordId) -> Result<Vec<DatabaseLink>> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for get_record_database_links")?;
        let rows = conn
            .query(
                "SELECT normalized_counterparty_id::bigint AS record_id,
                        project_database_id::bigint AS database_id,
                        COALESCE(source_reference, '') AS source_reference,
                        COALESCE(source_name, '') AS source_name
                 FROM counterparty_databases
                 WHERE normalized_counterparty_id = $1::bigint
                 ORDER BY id",
                &[&id],
            )
            .await
            .context(format!("Failed to load database links of counterparty {}", id))?;
        Ok(rows
            .iter()
            .map(|row| DatabaseLink {
                record_id: row.get("record_id"),
                database_id: row.get("database_id"),
                source_reference: row.get("source_reference"),
                source_name: row.get("source_name"),
            })
            .collect())
    }

    async fn save_record_database_link(&self, link: &DatabaseLink) -> Result<()> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for save_record_database_link")?;
        conn.execute(
            "INSERT INTO counterparty_databases
                 (normalized_counterparty_id, project_database_id, source_reference, source_name)
             VALUES ($1::bigint, $2::bigint, $3, $4)
             ON CONFLICT (normalized_counterparty_id, project_database_id, source_reference)
             DO NOTHING",
            &[
                &link.record_id,
                &link.database_id,
                &link.source_reference,
                &link.source_name,
            ],
        )
        .await
        .context(format!(
            "Failed to link counterparty {} to database {}",
            link.record_id, link.database_id
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_dropped() {
        assert_eq!(filter_param(&None), None);
        assert_eq!(filter_param(&Some("  ".to_string())), None);
        assert_eq!(filter_param(&Some(" 123 ".to_string())), Some("123".to_string()));
    }
}
