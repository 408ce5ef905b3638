//! Candidate-set derivation: scope path + feedback overlay → name→description
//! mapping.
//!
//! Derivation is a pure function over the immutable store. It never mutates
//! loaded taxonomy data; removals and additions are applied to a fresh
//! mapping, so a shared store cannot be contaminated across requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use fieldscope_shared::{Feedback, FieldscopeError, Result};

use crate::store::TaxonomyStore;

/// Scope path determining which children are valid candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Units of one college.
    Units { college: String },
    /// Fields under the chosen units of one college.
    Fields {
        college: String,
        units: Vec<String>,
    },
    /// Subfields under the chosen fields.
    Subfields { fields: Vec<String> },
}

/// An ordered name→description mapping scoped to one hierarchy level.
///
/// Never persisted; recomputed from the store plus the current feedback on
/// each stage iteration. Every key exists verbatim in the taxonomy except
/// feedback additions, which are synthetic entries with an empty description
/// pending model-authored justification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    entries: BTreeMap<String, String>,
}

impl CandidateSet {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    fn insert(&mut self, name: String, description: String) {
        if let Some(existing) = self.entries.get(&name) {
            if *existing != description {
                // Last-write-wins across parents; surfaced so a real naming
                // collision is not silently hidden.
                warn!(%name, "candidate name collision across parent scopes, keeping later entry");
            }
        }
        self.entries.insert(name, description);
    }
}

impl FromIterator<(String, String)> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Derive the candidate set for a scope, applying the feedback overlay.
///
/// Fails with `ScopeNotFound` if any path segment is missing from the store,
/// or if a multi-parent scope carries no parents at all (the cascading outcome
/// of an upstream level that exhausted its iterations with nothing confirmed).
pub fn derive(
    store: &TaxonomyStore,
    scope: &Scope,
    feedback: Option<&Feedback>,
) -> Result<CandidateSet> {
    let mut set = CandidateSet::default();

    match scope {
        Scope::Units { college } => {
            for (unit, entry) in store.college(college)? {
                set.insert(unit.clone(), entry.unit_description());
            }
        }
        Scope::Fields { college, units } => {
            if units.is_empty() {
                return Err(FieldscopeError::scope_not_found(format!(
                    "no units confirmed under college '{college}'"
                )));
            }
            for unit in units {
                let entry = store.unit(college, unit)?;
                if let Some(fields) = entry.fields() {
                    for (field, desc) in fields {
                        set.insert(field.clone(), desc.clone());
                    }
                }
            }
        }
        Scope::Subfields { fields } => {
            if fields.is_empty() {
                return Err(FieldscopeError::scope_not_found(
                    "no fields confirmed for subfield classification",
                ));
            }
            for field in fields {
                for (subfield, desc) in store.field_subfields(field)? {
                    set.insert(subfield.clone(), desc.clone());
                }
            }
        }
    }

    if let Some(feedback) = feedback {
        apply_overlay(&mut set, feedback);
    }

    Ok(set)
}

/// Apply feedback to a derived set: removals are best-effort deletes (missing
/// keys ignored), additions are idempotent inserts with an empty description.
fn apply_overlay(set: &mut CandidateSet, feedback: &Feedback) {
    for removal in &feedback.removals {
        set.entries.remove(removal);
    }
    for addition in &feedback.additions {
        set.entries
            .entry(addition.clone())
            .or_insert_with(String::new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::sample_store;

    const CLAS: &str = "College of Liberal Arts & Sciences";

    fn feedback(removals: &[&str], additions: &[&str]) -> Feedback {
        Feedback {
            removals: removals.iter().map(|s| s.to_string()).collect(),
            additions: additions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn unit_scope_lists_college_units() {
        let store = sample_store();
        let scope = Scope::Units {
            college: CLAS.into(),
        };
        let set = derive(&store, &scope, None).expect("derive");
        assert_eq!(set.len(), 3);
        assert!(set.contains("Chemistry Dept"));
        assert!(set.contains("Honors Program"));
    }

    #[test]
    fn derivation_is_idempotent() {
        let store = sample_store();
        let scope = Scope::Fields {
            college: CLAS.into(),
            units: vec!["Chemistry Dept".into(), "History Dept".into()],
        };
        let a = derive(&store, &scope, None).expect("first");
        let b = derive(&store, &scope, None).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn single_field_scope_matches_stored_description() {
        // Scenario A: no removals/additions — the set is exactly the stored
        // entries.
        let store = sample_store();
        let scope = Scope::Fields {
            college: CLAS.into(),
            units: vec!["Chemistry Dept".into()],
        };
        let set = derive(&store, &scope, Some(&Feedback::default())).expect("derive");
        assert_eq!(
            set.description("Chemistry"),
            Some("Study of matter and its transformations")
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn overlay_applies_removals_then_additions() {
        let store = sample_store();
        let scope = Scope::Fields {
            college: CLAS.into(),
            units: vec!["Chemistry Dept".into()],
        };
        let fb = feedback(&["Chemical Biology", "Not In Pool"], &["Astrochemistry"]);
        let set = derive(&store, &scope, Some(&fb)).expect("derive");

        assert!(!set.contains("Chemical Biology"));
        assert!(set.contains("Chemistry"));
        // Addition appears with an empty description for the model to justify.
        assert_eq!(set.description("Astrochemistry"), Some(""));
    }

    #[test]
    fn addition_does_not_clobber_existing_description() {
        let store = sample_store();
        let scope = Scope::Fields {
            college: CLAS.into(),
            units: vec!["Chemistry Dept".into()],
        };
        let fb = feedback(&[], &["Chemistry"]);
        let set = derive(&store, &scope, Some(&fb)).expect("derive");
        assert_eq!(
            set.description("Chemistry"),
            Some("Study of matter and its transformations")
        );
    }

    #[test]
    fn removal_of_missing_key_is_ignored() {
        let store = sample_store();
        let scope = Scope::Units {
            college: CLAS.into(),
        };
        let fb = feedback(&["No Such Unit"], &[]);
        let set = derive(&store, &scope, Some(&fb)).expect("derive");
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn multi_parent_union() {
        let store = sample_store();
        let scope = Scope::Subfields {
            fields: vec!["Chemistry".into(), "American History".into()],
        };
        let set = derive(&store, &scope, None).expect("derive");
        assert_eq!(set.len(), 3);
        assert!(set.contains("Organic Chemistry"));
        assert!(set.contains("African American History"));
    }

    #[test]
    fn missing_segment_fails_unretried() {
        let store = sample_store();

        let err = derive(
            &store,
            &Scope::Units {
                college: "Hogwarts".into(),
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FieldscopeError::ScopeNotFound { .. }));

        let err = derive(
            &store,
            &Scope::Fields {
                college: CLAS.into(),
                units: vec!["Alchemy Dept".into()],
            },
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Alchemy Dept"));
    }

    #[test]
    fn empty_parent_list_cascades_as_scope_not_found() {
        let store = sample_store();
        let err = derive(
            &store,
            &Scope::Subfields { fields: vec![] },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FieldscopeError::ScopeNotFound { .. }));
    }
}
