//! Taxonomy store and candidate-set derivation for FieldScope.
//!
//! The curated taxonomy lives in two master JSON mappings (college → unit →
//! field, and field → subfield). This crate loads them once into an immutable
//! [`TaxonomyStore`], derives scoped [`CandidateSet`]s with feedback overlays
//! applied on copies, and provides the offline `split`/`check` tooling for the
//! exploded per-scope files.

pub mod candidates;
pub mod check;
pub mod paths;
pub mod split;
pub mod store;

pub use candidates::{CandidateSet, Scope, derive};
pub use check::{DiscrepancyReport, check_discrepancies};
pub use paths::TaxonomyPaths;
pub use split::{SplitSummary, split_masters};
pub use store::{TaxonomyStore, UnitEntry};
