// src/models/core.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier of a counterparty record, owned by the record store.
pub type RecordId = i64;

/// A normalized counterparty (company) as held by the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterpartyRecord {
    pub id: RecordId,
    pub project_id: i64,
    pub name: String,
    pub tax_id: String,
    pub kpp: String,
    pub bin: String,
    pub legal_address: String,
    pub postal_address: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub contact_person: String,
    pub legal_form: String,
    pub bank_name: String,
    pub bank_account: String,
    pub correspondent_account: String,
    pub bik: String,
    pub quality_score: f64,
    pub source_enrichment: String,
    pub subcategory: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl CounterpartyRecord {
    /// The deterministic duplicate-grouping key: `tax_id` when present, else `bin`.
    /// Records with neither never group.
    pub fn group_key(&self) -> Option<&str> {
        let tax_id = self.tax_id.trim();
        if !tax_id.is_empty() {
            return Some(tax_id);
        }
        let bin = self.bin.trim();
        if !bin.is_empty() {
            return Some(bin);
        }
        None
    }
}

/// Association between a record and one of the source databases it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseLink {
    pub record_id: RecordId,
    pub database_id: i64,
    pub source_reference: String,
    pub source_name: String,
}

/// Optional filters for listing a project's records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Case-insensitive substring match on the record name.
    pub search: Option<String>,
    pub tax_id: Option<String>,
    pub bin: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &CounterpartyRecord) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            if !record
                .name
                .to_lowercase()
                .contains(&search.trim().to_lowercase())
            {
                return false;
            }
        }
        if let Some(tax_id) = self.tax_id.as_deref().filter(|s| !s.is_empty()) {
            if record.tax_id != tax_id {
                return false;
            }
        }
        if let Some(bin) = self.bin.as_deref().filter(|s| !s.is_empty()) {
            if record.bin != bin {
                return false;
            }
        }
        true
    }
}

/// One page of a listing plus the total number of matching records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<CounterpartyRecord>,
    pub total: usize,
}

/// Field overrides for bulk updates. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub kpp: Option<String>,
    pub bin: Option<String>,
    pub legal_address: Option<String>,
    pub postal_address: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub contact_person: Option<String>,
    pub legal_form: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub correspondent_account: Option<String>,
    pub bik: Option<String>,
    pub quality_score: Option<f64>,
    pub source_enrichment: Option<String>,
    pub subcategory: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.tax_id.is_none()
            && self.kpp.is_none()
            && self.bin.is_none()
            && self.legal_address.is_none()
            && self.postal_address.is_none()
            && self.contact_phone.is_none()
            && self.contact_email.is_none()
            && self.contact_person.is_none()
            && self.legal_form.is_none()
            && self.bank_name.is_none()
            && self.bank_account.is_none()
            && self.correspondent_account.is_none()
            && self.bik.is_none()
            && self.quality_score.is_none()
            && self.source_enrichment.is_none()
            && self.subcategory.is_none()
    }

    /// Applies every populated override to `record`.
    pub fn apply_to(&self, record: &mut CounterpartyRecord) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        set(&mut record.name, &self.name);
        set(&mut record.tax_id, &self.tax_id);
        set(&mut record.kpp, &self.kpp);
        set(&mut record.bin, &self.bin);
        set(&mut record.legal_address, &self.legal_address);
        set(&mut record.postal_address, &self.postal_address);
        set(&mut record.contact_phone, &self.contact_phone);
        set(&mut record.contact_email, &self.contact_email);
        set(&mut record.contact_person, &self.contact_person);
        set(&mut record.legal_form, &self.legal_form);
        set(&mut record.bank_name, &self.bank_name);
        set(&mut record.bank_account, &self.bank_account);
        set(&mut record.correspondent_account, &self.correspondent_account);
        set(&mut record.bik, &self.bik);
        set(&mut record.source_enrichment, &self.source_enrichment);
        set(&mut record.subcategory, &self.subcategory);
        if let Some(score) = self.quality_score {
            record.quality_score = score;
        }
    }
}
