//! Record deduplication.

use std::collections::HashSet;

use crate::models::BusinessRecord;

/// `lower(name)-lower(address)`.
pub fn dedup_key(record: &BusinessRecord) -> String {
    format!(
        "{}-{}",
        record.name.to_lowercase(),
        record.address.to_lowercase()
    )
}

/// Keep the first record for each key, preserving order.
pub fn deduplicate(records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect()
}
