//! Consistency check between the two master mappings.
//!
//! A field referenced by some college should have a subfield entry, and the
//! field→subfield master should not carry fields no college references.
//! `fieldscope check` reports both directions.

use tracing::{instrument, warn};

use crate::store::TaxonomyStore;

/// Discrepancies between the college→field and field→subfield masters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscrepancyReport {
    /// Fields appearing under some college but missing from the
    /// field→subfield master. Subfield classification for these will fail
    /// with `ScopeNotFound`.
    pub missing_subfield_entries: Vec<String>,
    /// Fields in the field→subfield master that no college references.
    pub orphan_fields: Vec<String>,
}

impl DiscrepancyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_subfield_entries.is_empty() && self.orphan_fields.is_empty()
    }
}

/// Compare the two masters and report fields present in one but not the other.
#[instrument(skip_all)]
pub fn check_discrepancies(store: &TaxonomyStore) -> DiscrepancyReport {
    let college_fields = store.all_field_names();

    let missing_subfield_entries: Vec<String> = college_fields
        .iter()
        .filter(|f| store.field_subfields(f).is_err())
        .cloned()
        .collect();

    let orphan_fields: Vec<String> = store
        .subfield_master_fields()
        .filter(|f| !college_fields.contains(*f))
        .map(str::to_string)
        .collect();

    if !missing_subfield_entries.is_empty() {
        warn!(
            count = missing_subfield_entries.len(),
            "fields without subfield entries"
        );
    }
    if !orphan_fields.is_empty() {
        warn!(count = orphan_fields.len(), "orphan fields in subfield master");
    }

    DiscrepancyReport {
        missing_subfield_entries,
        orphan_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaxonomyStore;
    use crate::store::test_support::sample_store;

    #[test]
    fn sample_store_has_known_gaps() {
        let report = check_discrepancies(&sample_store());
        // Chemical Biology, Global History, Journalism have no subfield
        // entries in the sample.
        assert!(
            report
                .missing_subfield_entries
                .contains(&"Journalism".to_string())
        );
        assert!(
            report
                .missing_subfield_entries
                .contains(&"Global History".to_string())
        );
        assert!(report.orphan_fields.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn aligned_masters_are_clean() {
        let colleges = serde_json::from_value(serde_json::json!({
            "C": { "U": { "F": "desc" } }
        }))
        .expect("colleges");
        let subfields = serde_json::from_value(serde_json::json!({
            "F": { "S": "desc" }
        }))
        .expect("subfields");
        let store = TaxonomyStore::from_parts(colleges, subfields);

        assert!(check_discrepancies(&store).is_clean());
    }

    #[test]
    fn orphan_fields_reported() {
        let colleges = serde_json::from_value(serde_json::json!({
            "C": { "U": { "F": "desc" } }
        }))
        .expect("colleges");
        let subfields = serde_json::from_value(serde_json::json!({
            "F": { "S": "desc" },
            "Ghost Field": { "S2": "desc" }
        }))
        .expect("subfields");
        let store = TaxonomyStore::from_parts(colleges, subfields);

        let report = check_discrepancies(&store);
        assert_eq!(report.orphan_fields, vec!["Ghost Field".to_string()]);
    }
}
