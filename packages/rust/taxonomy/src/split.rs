//! Offline splitting of the master mappings into per-scope files.
//!
//! `fieldscope split` explodes the two masters into one JSON file per college
//! and one per field. The exploded files are a convenience for inspection and
//! downstream tooling; the pipeline itself reads only the in-memory masters.

use std::fs;

use tracing::{info, instrument};

use fieldscope_shared::{FieldscopeError, Result};

use crate::paths::TaxonomyPaths;
use crate::store::TaxonomyStore;

/// Counts of files written by [`split_masters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub colleges_written: usize,
    pub fields_written: usize,
}

/// Write one file per college and one per field under the data directory.
#[instrument(skip_all, fields(data_dir = %paths.data_dir.display()))]
pub fn split_masters(store: &TaxonomyStore, paths: &TaxonomyPaths) -> Result<SplitSummary> {
    let college_dir = paths.college_mappings_dir();
    let field_dir = paths.field_mappings_dir();
    fs::create_dir_all(&college_dir).map_err(|e| FieldscopeError::io(&college_dir, e))?;
    fs::create_dir_all(&field_dir).map_err(|e| FieldscopeError::io(&field_dir, e))?;

    let mut summary = SplitSummary::default();

    for (college, units) in store.colleges() {
        let path = paths.college_file(college);
        let content = serde_json::to_string_pretty(units)
            .map_err(|e| FieldscopeError::taxonomy(format!("serialize '{college}': {e}")))?;
        fs::write(&path, content).map_err(|e| FieldscopeError::io(&path, e))?;
        summary.colleges_written += 1;
    }

    for (field, subfields) in store.subfield_master() {
        let path = paths.field_file(field);
        let content = serde_json::to_string_pretty(subfields)
            .map_err(|e| FieldscopeError::taxonomy(format!("serialize '{field}': {e}")))?;
        fs::write(&path, content).map_err(|e| FieldscopeError::io(&path, e))?;
        summary.fields_written += 1;
    }

    info!(
        colleges = summary.colleges_written,
        fields = summary.fields_written,
        "split masters into per-scope files"
    );

    Ok(summary)
}
