//! File layout of the taxonomy data directory.
//!
//! ```text
//! <data_dir>/
//!   master_college_field.json          # college → unit → field → description
//!   master_field_subfield.json         # field → subfield → description
//!   college_field_mappings/<college>.json   # exploded per-college files
//!   field_subfield_mappings/<field>.json    # exploded per-field files
//! ```
//!
//! The exploded files are produced by the offline `split` step; classify-time
//! lookups are served from the in-memory masters only.

use std::path::PathBuf;

/// Master college→unit→field mapping file name.
pub const MASTER_COLLEGE_FIELD_JSON: &str = "master_college_field.json";

/// Master field→subfield mapping file name.
pub const MASTER_FIELD_SUBFIELD_JSON: &str = "master_field_subfield.json";

/// Directory of exploded per-college files.
pub const COLLEGE_FIELD_MAPPINGS_DIR: &str = "college_field_mappings";

/// Directory of exploded per-field files.
pub const FIELD_SUBFIELD_MAPPINGS_DIR: &str = "field_subfield_mappings";

/// Resolved paths under a taxonomy data directory.
#[derive(Debug, Clone)]
pub struct TaxonomyPaths {
    pub data_dir: PathBuf,
}

impl TaxonomyPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn master_college_field(&self) -> PathBuf {
        self.data_dir.join(MASTER_COLLEGE_FIELD_JSON)
    }

    pub fn master_field_subfield(&self) -> PathBuf {
        self.data_dir.join(MASTER_FIELD_SUBFIELD_JSON)
    }

    pub fn college_mappings_dir(&self) -> PathBuf {
        self.data_dir.join(COLLEGE_FIELD_MAPPINGS_DIR)
    }

    pub fn field_mappings_dir(&self) -> PathBuf {
        self.data_dir.join(FIELD_SUBFIELD_MAPPINGS_DIR)
    }

    /// Exploded file for one college.
    pub fn college_file(&self, college: &str) -> PathBuf {
        self.college_mappings_dir()
            .join(format!("{}.json", sanitize_name(college)))
    }

    /// Exploded file for one field.
    pub fn field_file(&self, field: &str) -> PathBuf {
        self.field_mappings_dir()
            .join(format!("{}.json", sanitize_name(field)))
    }
}

/// Make a taxonomy label safe to use as a file name. Path separators would
/// otherwise escape the mappings directory.
fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "-")
}
