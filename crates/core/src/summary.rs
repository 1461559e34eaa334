use crate::models::CatalogRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Distinct candidate texts per category across the whole catalog.
pub fn entity_summary(records: &[CatalogRecord]) -> BTreeMap<String, BTreeSet<String>> {
    let mut summary: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for record in records {
        for (category, candidates) in &record.entities {
            if candidates.is_empty() {
                continue;
            }
            let values = summary.entry(category.clone()).or_default();
            for candidate in candidates {
                values.insert(candidate.text.clone());
            }
        }
    }

    summary
}
