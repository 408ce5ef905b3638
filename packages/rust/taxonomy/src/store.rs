//! Read-only, load-once taxonomy store.
//!
//! The store holds the two master mappings in memory and is constructed
//! explicitly at process start, then shared by reference with every stage.
//! Nothing here reloads or mutates the loaded data; candidate-set overlays
//! are applied on copies (see [`crate::candidates`]).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use fieldscope_shared::{FieldscopeError, Result};

use crate::paths::TaxonomyPaths;

/// Value under a unit in the college master: either a nested field map or,
/// for units with no fields of their own, a direct description string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitEntry {
    Fields(BTreeMap<String, String>),
    Description(String),
}

impl UnitEntry {
    /// Description to present for the unit itself at unit-level
    /// classification. Units carrying a nested field map have no stored
    /// description, so one is synthesized from their field names.
    pub fn unit_description(&self) -> String {
        match self {
            Self::Description(d) => d.clone(),
            Self::Fields(fields) => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                format!("Covers: {}", names.join(", "))
            }
        }
    }

    /// The unit's fields, empty for description-only units.
    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Description(_) => None,
        }
    }
}

/// Immutable nested lookups over the curated taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyStore {
    /// college → unit → entry.
    colleges: BTreeMap<String, BTreeMap<String, UnitEntry>>,
    /// field → subfield → description.
    subfields: BTreeMap<String, BTreeMap<String, String>>,
}

impl TaxonomyStore {
    /// Construct a store directly from in-memory mappings (tests, tooling).
    pub fn from_parts(
        colleges: BTreeMap<String, BTreeMap<String, UnitEntry>>,
        subfields: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Self {
        Self {
            colleges,
            subfields,
        }
    }

    /// Load both master mappings from the data directory. This is the single
    /// explicit construction point; nothing reloads afterwards.
    #[instrument(skip_all, fields(data_dir = %paths.data_dir.display()))]
    pub fn load(paths: &TaxonomyPaths) -> Result<Self> {
        let colleges = read_json(&paths.master_college_field())?;
        let subfields = read_json(&paths.master_field_subfield())?;

        let store = Self {
            colleges,
            subfields,
        };

        info!(
            colleges = store.colleges.len(),
            fields = store.subfields.len(),
            "taxonomy store loaded"
        );

        Ok(store)
    }

    /// Units of one college. Fails with `ScopeNotFound` for unknown colleges.
    pub fn college(&self, college: &str) -> Result<&BTreeMap<String, UnitEntry>> {
        self.colleges
            .get(college)
            .ok_or_else(|| FieldscopeError::scope_not_found(format!("college '{college}'")))
    }

    /// One unit's entry within a college.
    pub fn unit(&self, college: &str, unit: &str) -> Result<&UnitEntry> {
        self.college(college)?.get(unit).ok_or_else(|| {
            FieldscopeError::scope_not_found(format!("unit '{unit}' in college '{college}'"))
        })
    }

    /// Subfields of one field. Fails with `ScopeNotFound` for fields absent
    /// from the field→subfield master.
    pub fn field_subfields(&self, field: &str) -> Result<&BTreeMap<String, String>> {
        self.subfields
            .get(field)
            .ok_or_else(|| FieldscopeError::scope_not_found(format!("field '{field}'")))
    }

    /// Every field name appearing anywhere in the college master, regardless
    /// of college or unit. Used by the enhancement validator's structural
    /// check.
    pub fn all_field_names(&self) -> BTreeSet<String> {
        self.colleges
            .values()
            .flat_map(|units| units.values())
            .filter_map(UnitEntry::fields)
            .flat_map(|fields| fields.keys().cloned())
            .collect()
    }

    /// All college names, for tooling output.
    pub fn college_names(&self) -> impl Iterator<Item = &str> {
        self.colleges.keys().map(String::as_str)
    }

    /// All field names in the field→subfield master, for tooling output.
    pub fn subfield_master_fields(&self) -> impl Iterator<Item = &str> {
        self.subfields.keys().map(String::as_str)
    }

    pub(crate) fn colleges(&self) -> &BTreeMap<String, BTreeMap<String, UnitEntry>> {
        &self.colleges
    }

    pub(crate) fn subfield_master(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.subfields
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| FieldscopeError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        FieldscopeError::taxonomy(format!("failed to parse {}: {e}", path.display()))
    })
}
