// src/consolidation/field_merge.rs - Field precedence when folding a duplicate into its master
use crate::models::core::CounterpartyRecord;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Takes `candidate` only when `target` is blank.
fn fill_if_empty(target: &mut String, candidate: &str) -> bool {
    if is_blank(target) && !is_blank(candidate) {
        *target = candidate.to_string();
        return true;
    }
    false
}

/// Takes `candidate` when `target` is blank or strictly shorter (in chars).
fn prefer_longer(target: &mut String, candidate: &str) -> bool {
    if is_blank(candidate) {
        return false;
    }
    if is_blank(target) || candidate.chars().count() > target.chars().count() {
        *target = candidate.to_string();
        return true;
    }
    false
}

/// Folds `duplicate` into `master` and returns the number of fields changed.
///
/// Identifiers and descriptive fields are only filled when the master lacks
/// them; addresses and the contact person keep the longer value. Ids, the
/// project and the quality score are never touched. Merging the same
/// duplicate twice changes nothing the second time.
pub fn merge_fields(master: &mut CounterpartyRecord, duplicate: &CounterpartyRecord) -> usize {
    let filled = [
        fill_if_empty(&mut master.tax_id, &duplicate.tax_id),
        fill_if_empty(&mut master.bin, &duplicate.bin),
        fill_if_empty(&mut master.kpp, &duplicate.kpp),
        fill_if_empty(&mut master.bank_name, &duplicate.bank_name),
        fill_if_empty(&mut master.bank_account, &duplicate.bank_account),
        fill_if_empty(&mut master.correspondent_account, &duplicate.correspondent_account),
        fill_if_empty(&mut master.bik, &duplicate.bik),
        fill_if_empty(&mut master.name, &duplicate.name),
        fill_if_empty(&mut master.contact_phone, &duplicate.contact_phone),
        fill_if_empty(&mut master.contact_email, &duplicate.contact_email),
        fill_if_empty(&mut master.legal_form, &duplicate.legal_form),
        fill_if_empty(&mut master.source_enrichment, &duplicate.source_enrichment),
        fill_if_empty(&mut master.subcategory, &duplicate.subcategory),
        prefer_longer(&mut master.legal_address, &duplicate.legal_address),
        prefer_longer(&mut master.postal_address, &duplicate.postal_address),
        prefer_longer(&mut master.contact_person, &duplicate.contact_person),
    ];
    filled.iter().filter(|&&changed| changed).count()
}
