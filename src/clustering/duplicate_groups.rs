// src/clustering/duplicate_groups.rs - Exact-key duplicate grouping
//
// Records are grouped by `CounterpartyRecord::group_key` (tax id, else BIN).
// Grouping is deterministic: groups come out in the order their key is first
// seen, members keep their input order, and singletons are dropped.

use log::debug;
use std::collections::HashMap;

use crate::models::core::CounterpartyRecord;
use crate::models::merge::DuplicateGroup;
use crate::utils::logging::{ResolutionLogger, ResolutionOperation};

/// Partitions `records` into groups of two or more records sharing a key.
/// Records without a key never appear in any group.
pub fn group_duplicates(records: &[CounterpartyRecord]) -> Vec<DuplicateGroup> {
    let logger = ResolutionLogger::new(ResolutionOperation::Grouping);

    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&CounterpartyRecord>> = HashMap::new();
    let mut keyed = 0usize;

    for record in records {
        let Some(key) = record.group_key() else {
            continue;
        };
        keyed += 1;
        buckets
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    let groups: Vec<DuplicateGroup> = order
        .into_iter()
        .filter_map(|key| {
            let members = buckets.remove(key)?;
            if members.len() < 2 {
                return None;
            }
            debug!("Duplicate group {} has {} members", key, members.len());
            Some(DuplicateGroup {
                key: key.to_string(),
                members: members.into_iter().cloned().collect(),
            })
        })
        .collect();

    logger.log_grouping_complete(records.len(), keyed, groups.len());
    groups
}

/// Every record whose grouping key equals `key` (after trimming), in input order.
pub fn records_for_key<'a>(
    records: &'a [CounterpartyRecord],
    key: &str,
) -> Vec<&'a CounterpartyRecord> {
    let key = key.trim();
    if key.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| r.group_key() == Some(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, tax_id: &str, bin: &str) -> CounterpartyRecord {
        CounterpartyRecord {
            id,
            name: format!("Company {}", id),
            tax_id: tax_id.to_string(),
            bin: bin.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_by_tax_id_then_bin() {
        let records = vec![
            record(1, "123", ""),
            record(2, "", "990"),
            record(3, "123", "555"),
            record(4, "", "990"),
            record(5, "777", ""),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "123");
        assert_eq!(groups[0].member_ids(), vec![1, 3]);
        assert_eq!(groups[1].key, "990");
        assert_eq!(groups[1].member_ids(), vec![2, 4]);
    }

    #[test]
    fn test_records_without_key_never_group() {
        let records = vec![record(1, "", ""), record(2, "  ", " "), record(3, "", "")];
        assert!(group_duplicates(&records).is_empty());
        assert!(records_for_key(&records, "").is_empty());
    }

    #[test]
    fn test_tax_id_shadows_bin() {
        // record 2 has a tax id, so its BIN is not its key
        let records = vec![record(1, "", "990"), record(2, "111", "990")];
        assert!(group_duplicates(&records).is_empty());
    }

    #[test]
    fn test_records_for_key() {
        let records = vec![record(1, " 123 ", ""), record(2, "", "123"), record(3, "456", "")];
        let ids: Vec<i64> = records_for_key(&records, "123").iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
