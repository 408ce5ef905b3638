//! Core domain types for FieldScope classification runs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder candidate score. The underlying capability returns an
/// unordered accept/reject judgment per item, not a calibrated probability,
/// so every accepted candidate carries this constant.
pub const PLACEHOLDER_SCORE: f64 = 1.0;

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for classification request identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a new time-sortable request identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// ClassificationRequest
// ---------------------------------------------------------------------------

/// The immutable input to a classification run.
///
/// Created once per run and never mutated. The optional unit hint steers
/// classifier prompts only; it never filters the candidate pool locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Unique identifier for tracing in logs.
    pub id: RequestId,
    /// Free-text research description to classify.
    pub description: String,
    /// College name scoping the unit-level candidate pool.
    pub college: String,
    /// Optional administrative unit / department hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_hint: Option<String>,
}

impl ClassificationRequest {
    /// Build a request with a fresh identifier.
    pub fn new(description: impl Into<String>, college: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            description: description.into(),
            college: college.into(),
            unit_hint: None,
        }
    }

    /// Attach an administrative unit / department hint.
    pub fn with_unit_hint(mut self, hint: impl Into<String>) -> Self {
        self.unit_hint = Some(hint.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// The three hierarchy levels classified in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Unit,
    Field,
    Subfield,
}

impl Level {
    /// Stable name for log events and prompt wording.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Field => "field",
            Self::Subfield => "subfield",
        }
    }

    /// Label used when talking to the model. "Field" reads more naturally to
    /// the LLM than "unit", so all three levels present as fields of study.
    pub fn prompt_noun(&self) -> &'static str {
        match self {
            Self::Unit => "Fields",
            Self::Field => "Fields",
            Self::Subfield => "Subfields",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A single proposed label at some hierarchy level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Label name, verbatim-equal to a taxonomy entry.
    pub name: String,
    /// Informational score; currently always [`PLACEHOLDER_SCORE`].
    pub score: f64,
    /// Model-authored reason why this candidate fits the description.
    #[serde(default)]
    pub rationale: String,
}

impl Candidate {
    /// Build a candidate with the placeholder score.
    pub fn new(name: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: PLACEHOLDER_SCORE,
            rationale: rationale.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Removal/addition deltas carried from a validator to the next classifier
/// attempt at the same level, and into candidate-set derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Labels the previous validator rejected; subtracted from the pool.
    #[serde(default)]
    pub removals: BTreeSet<String>,
    /// Labels explicitly requested in the pool; inserted with an empty
    /// description for the model to justify.
    #[serde(default)]
    pub additions: BTreeSet<String>,
}

impl Feedback {
    /// True when there are no deltas to apply.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }

    /// Build feedback from a validator's removal and addition lists.
    pub fn from_report(removals: &[String], additions: &[String]) -> Self {
        Self {
            removals: removals.iter().cloned().collect(),
            additions: additions.iter().cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationReport / Satisfaction
// ---------------------------------------------------------------------------

/// Structured verdict from a validator stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the proposed label set passes the check.
    pub is_valid: bool,
    /// Human-readable justification for the decision.
    #[serde(default)]
    pub reason: String,
    /// Labels that, if removed, would make the set valid.
    #[serde(default)]
    pub removals: Vec<String>,
    /// Labels requested to appear in the next candidate pool.
    #[serde(default)]
    pub additions: Vec<String>,
}

impl ValidationReport {
    /// A passing report with the given reason.
    pub fn valid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            reason: reason.into(),
            removals: Vec::new(),
            additions: Vec::new(),
        }
    }

    /// A failing report with the given reason and removal list.
    pub fn invalid(reason: impl Into<String>, removals: Vec<String>) -> Self {
        Self {
            is_valid: false,
            reason: reason.into(),
            removals,
            additions: Vec::new(),
        }
    }

    /// Coarse projection used as the loop-termination predicate.
    pub fn satisfaction(&self) -> Satisfaction {
        if self.is_valid {
            Satisfaction::Satisfied
        } else {
            Satisfaction::Unsatisfied
        }
    }
}

/// Binary loop-termination signal derived from a [`ValidationReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Satisfaction {
    Satisfied,
    Unsatisfied,
}

impl Satisfaction {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_roundtrip() {
        let id = RequestId::new();
        let s = id.to_string();
        let parsed: RequestId = s.parse().expect("parse RequestId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn request_serialization() {
        let req = ClassificationRequest::new(
            "Monte Carlo methods and population genetics",
            "College of Liberal Arts & Sciences",
        )
        .with_unit_hint("Statistics");

        let json = serde_json::to_string(&req).expect("serialize");
        let parsed: ClassificationRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.college, "College of Liberal Arts & Sciences");
        assert_eq!(parsed.unit_hint.as_deref(), Some("Statistics"));
    }

    #[test]
    fn feedback_from_report_dedupes() {
        let fb = Feedback::from_report(
            &["Chemistry".into(), "Chemistry".into()],
            &["Phrenology".into()],
        );
        assert_eq!(fb.removals.len(), 1);
        assert_eq!(fb.additions.len(), 1);
        assert!(!fb.is_empty());
        assert!(Feedback::default().is_empty());
    }

    #[test]
    fn report_satisfaction_projection() {
        assert!(ValidationReport::valid("fits").satisfaction().is_satisfied());
        assert!(
            !ValidationReport::invalid("no", vec![])
                .satisfaction()
                .is_satisfied()
        );
    }

    #[test]
    fn level_names() {
        assert_eq!(Level::Unit.as_str(), "unit");
        assert_eq!(Level::Subfield.prompt_noun(), "Subfields");
        assert_eq!(Level::Unit.prompt_noun(), "Fields");
    }
}
